use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::{AwsIntegration, ThirdPartyProvider};
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::cipher::SecretCipher;
use crate::client_kind::{Client, ClientKind, HttpApiClient};
use crate::config::{CredentialCacheConfig, DeploymentMode};
use crate::error::CredentialCacheError;
use crate::store::IntegrationStore;
use crate::sts_port::{AssumeRoleParams, AwsStsPort, TemporaryCredentials};

#[derive(Clone)]
struct CacheEntry {
    client: Client,
    expiry: DateTime<Utc>,
}

fn reused(expiry: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expiry - now > chrono::Duration::minutes(5)
}

/// Per-workspace client cache keyed by `(workspace_id, kind)`, generalizing
/// `ai-llm-service::LlmServiceProfiles`'s `RwLock<HashMap<ClientKey, Arc<_>>>`
/// client-cache pattern from `(provider, endpoint, model, api_key, timeout)`
/// to `(workspace, kind)` (base spec §4.2).
pub struct ClientCache {
    entries: RwLock<HashMap<(Uuid, ClientKind), CacheEntry>>,
    owner_credentials: Mutex<Option<TemporaryCredentials>>,
    sts: Arc<dyn AwsStsPort>,
    store: Arc<dyn IntegrationStore>,
    cipher: Arc<dyn SecretCipher>,
    config: CredentialCacheConfig,
}

impl ClientCache {
    pub fn new(
        sts: Arc<dyn AwsStsPort>,
        store: Arc<dyn IntegrationStore>,
        cipher: Arc<dyn SecretCipher>,
        config: CredentialCacheConfig,
    ) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            owner_credentials: Mutex::new(None),
            sts,
            store,
            cipher,
            config,
        }
    }

    /// Invalidates one, some, or all cached entries, per §4.2.
    pub async fn clear(&self, workspace: Option<Uuid>, kind: Option<ClientKind>) {
        let mut entries = self.entries.write().await;
        entries.retain(|(ws, k), _| {
            let matches = workspace.map(|w| w == *ws).unwrap_or(true)
                && kind.map(|kk| kk == *k).unwrap_or(true);
            !matches
        });
    }

    pub async fn get_client(
        &self,
        workspace: Uuid,
        kind: ClientKind,
    ) -> Result<Client, CredentialCacheError> {
        let now = Utc::now();
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&(workspace, kind)) {
                if reused(entry.expiry, now) {
                    return Ok(entry.client.clone());
                }
            }
        }

        let (client, expiry) = match kind {
            ClientKind::CloudWatchLogs | ClientKind::CloudWatchMetrics => {
                self.build_cloudwatch_client(workspace, kind).await?
            }
            ClientKind::DatadogLogs | ClientKind::DatadogMetrics => {
                self.build_http_client(workspace, kind, ThirdPartyProvider::Datadog).await?
            }
            ClientKind::NewRelicLogs | ClientKind::NewRelicMetrics => {
                self.build_http_client(workspace, kind, ThirdPartyProvider::NewRelic).await?
            }
            ClientKind::GrafanaLogs | ClientKind::GrafanaMetrics => {
                self.build_http_client(workspace, kind, ThirdPartyProvider::Grafana).await?
            }
        };

        // Concurrent callers may race here; per §4.2 both resulting clients
        // are valid and the last write simply wins — no lock is required for
        // correctness, only for avoiding a torn read of the HashMap itself.
        let mut entries = self.entries.write().await;
        entries.insert((workspace, kind), CacheEntry { client: client.clone(), expiry });
        Ok(client)
    }

    async fn build_cloudwatch_client(
        &self,
        workspace: Uuid,
        kind: ClientKind,
    ) -> Result<(Client, DateTime<Utc>), CredentialCacheError> {
        let integration = self
            .store
            .load_aws(workspace)
            .await?
            .ok_or(CredentialCacheError::NoActiveIntegration)?;

        let creds = self.decrypted_credentials(&integration).await?;

        let expiry_system_time = std::time::UNIX_EPOCH
            + std::time::Duration::from_secs(creds.expiration.timestamp().max(0) as u64);
        let aws_creds = aws_sdk_sts::config::Credentials::new(
            creds.access_key_id,
            creds.secret_access_key,
            Some(creds.session_token),
            Some(expiry_system_time),
            "health-review-client-role",
        );
        let region = aws_config::Region::new(integration.region.clone());
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(region)
            .credentials_provider(aws_creds)
            .load()
            .await;

        let client = match kind {
            ClientKind::CloudWatchLogs => {
                Client::CloudWatchLogs(Arc::new(aws_sdk_cloudwatchlogs::Client::new(&sdk_config)))
            }
            ClientKind::CloudWatchMetrics => {
                Client::CloudWatchMetrics(Arc::new(aws_sdk_cloudwatch::Client::new(&sdk_config)))
            }
            _ => unreachable!("only called for CloudWatch kinds"),
        };

        Ok((client, creds.expiration))
    }

    /// Re-assumes the client role if the integration's stored expiry is
    /// within five minutes, re-encrypts, and persists before returning
    /// plaintext credentials. Failure here is `credentials_refresh_failed`
    /// (§4.2) — the integration stays active, only this call aborts.
    async fn decrypted_credentials(
        &self,
        integration: &AwsIntegration,
    ) -> Result<TemporaryCredentials, CredentialCacheError> {
        let now = Utc::now();
        if !integration.needs_refresh(now) {
            return Ok(TemporaryCredentials {
                access_key_id: self.cipher.decrypt(&integration.encrypted_access_key)?,
                secret_access_key: self.cipher.decrypt(&integration.encrypted_secret_key)?,
                session_token: self.cipher.decrypt(&integration.encrypted_session_token)?,
                expiration: integration.credentials_expiration,
            });
        }

        let external_id = integration
            .encrypted_external_id
            .as_ref()
            .map(|e| self.cipher.decrypt(e))
            .transpose()?;

        let fresh = self
            .assume_client_role(&integration.role_arn, &integration.region, external_id)
            .await
            .map_err(|e| CredentialCacheError::CredentialsRefreshFailed(e.to_string()))?;

        let mut updated = integration.clone();
        updated.encrypted_access_key = self.cipher.encrypt(&fresh.access_key_id)?;
        updated.encrypted_secret_key = self.cipher.encrypt(&fresh.secret_access_key)?;
        updated.encrypted_session_token = self.cipher.encrypt(&fresh.session_token)?;
        updated.credentials_expiration = fresh.expiration;

        self.store
            .save_aws(&updated)
            .await
            .map_err(|e| CredentialCacheError::CredentialsRefreshFailed(e.to_string()))?;

        info!(workspace_id = %integration.workspace_id, "refreshed AWS client-role credentials");
        Ok(fresh)
    }

    async fn assume_client_role(
        &self,
        role_arn: &str,
        region: &str,
        external_id: Option<String>,
    ) -> Result<TemporaryCredentials, CredentialCacheError> {
        let base_credentials = match self.config.mode {
            DeploymentMode::DevOrStaging => Some(self.assume_owner_role(region).await?),
            DeploymentMode::Production => None,
        };

        self.sts
            .assume_role(AssumeRoleParams {
                role_arn: role_arn.to_string(),
                session_name: "health-review-client-session".to_string(),
                external_id,
                duration_seconds: self.config.client_role_duration_seconds,
                region: region.to_string(),
                base_credentials,
            })
            .await
    }

    /// Caches owner-role credentials for their full TTL minus the five
    /// minute safety margin shared with every other refresh decision here.
    async fn assume_owner_role(
        &self,
        region: &str,
    ) -> Result<TemporaryCredentials, CredentialCacheError> {
        let owner_role_arn = self
            .config
            .owner_role_arn
            .clone()
            .ok_or_else(|| CredentialCacheError::CredentialsRefreshFailed(
                "OWNER_ROLE_ARN is not configured but deployment mode requires two-stage auth".into(),
            ))?;

        let mut cached = self.owner_credentials.lock().await;
        let now = Utc::now();
        if let Some(creds) = cached.as_ref() {
            if reused(creds.expiration, now) {
                return Ok(creds.clone());
            }
        }

        let fresh = self
            .sts
            .assume_role(AssumeRoleParams {
                role_arn: owner_role_arn,
                session_name: self.config.owner_role_session_name.clone(),
                external_id: self.config.owner_role_external_id.clone(),
                duration_seconds: self.config.owner_role_duration_seconds,
                region: region.to_string(),
                base_credentials: None,
            })
            .await?;

        *cached = Some(fresh.clone());
        Ok(fresh)
    }

    async fn build_http_client(
        &self,
        workspace: Uuid,
        kind: ClientKind,
        provider: ThirdPartyProvider,
    ) -> Result<(Client, DateTime<Utc>), CredentialCacheError> {
        let integration = self
            .store
            .load_third_party(workspace, provider)
            .await?
            .ok_or(CredentialCacheError::NoActiveIntegration)?;

        if !integration.active {
            return Err(CredentialCacheError::NoActiveIntegration);
        }

        let api_key = self.cipher.decrypt(&integration.encrypted_api_key)?;
        let app_key = integration
            .encrypted_app_key
            .as_ref()
            .map(|k| self.cipher.decrypt(k))
            .transpose()?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| CredentialCacheError::Cipher(e.to_string()))?;

        let client = Client::Http(Arc::new(HttpApiClient {
            http,
            base_url: integration.base_url,
            api_key,
            app_key,
        }));

        // Static API-key credentials never expire; cache them far out so the
        // five-minute reuse window never forces a needless rebuild.
        let far_future = Utc::now() + chrono::Duration::days(365);
        let _ = kind;
        Ok((client, far_future))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::IdentityCipher;
    use async_trait::async_trait;
    use domain::ThirdPartyIntegration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSts {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AwsStsPort for FakeSts {
        async fn assume_role(
            &self,
            params: AssumeRoleParams,
        ) -> Result<TemporaryCredentials, CredentialCacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TemporaryCredentials {
                access_key_id: format!("AKIA-{}", params.role_arn),
                secret_access_key: "secret".into(),
                session_token: "token".into(),
                expiration: Utc::now() + chrono::Duration::hours(1),
            })
        }
    }

    struct FakeStore {
        aws: AwsIntegration,
    }

    #[async_trait]
    impl IntegrationStore for FakeStore {
        async fn load_aws(&self, _workspace_id: Uuid) -> Result<Option<AwsIntegration>, CredentialCacheError> {
            Ok(Some(self.aws.clone()))
        }

        async fn save_aws(&self, _integration: &AwsIntegration) -> Result<(), CredentialCacheError> {
            Ok(())
        }

        async fn load_third_party(
            &self,
            _workspace_id: Uuid,
            _provider: ThirdPartyProvider,
        ) -> Result<Option<ThirdPartyIntegration>, CredentialCacheError> {
            Ok(None)
        }
    }

    fn sample_integration(expiration: DateTime<Utc>) -> AwsIntegration {
        AwsIntegration {
            workspace_id: Uuid::new_v4(),
            role_arn: "arn:aws:iam::123456789012:role/client".into(),
            encrypted_access_key: "ak".into(),
            encrypted_secret_key: "sk".into(),
            encrypted_session_token: "tok".into(),
            credentials_expiration: expiration,
            region: "us-east-1".into(),
            encrypted_external_id: None,
            active: true,
        }
    }

    #[tokio::test]
    async fn reuses_entry_within_five_minute_window() {
        let aws = sample_integration(Utc::now() + chrono::Duration::hours(1));
        let cache = ClientCache::new(
            Arc::new(FakeSts { calls: AtomicUsize::new(0) }),
            Arc::new(FakeStore { aws }),
            Arc::new(IdentityCipher),
            CredentialCacheConfig {
                mode: DeploymentMode::Production,
                owner_role_arn: None,
                owner_role_session_name: "owner".into(),
                owner_role_duration_seconds: 3600,
                owner_role_external_id: None,
                client_role_duration_seconds: 3600,
            },
        );

        let ws = Uuid::new_v4();
        let first = cache.get_client(ws, ClientKind::CloudWatchLogs).await.unwrap();
        let second = cache.get_client(ws, ClientKind::CloudWatchLogs).await.unwrap();
        assert!(first.as_cloudwatch_logs().is_some());
        assert!(second.as_cloudwatch_logs().is_some());
    }

    #[tokio::test]
    async fn refreshes_when_expiry_inside_safety_margin() {
        let aws = sample_integration(Utc::now() + chrono::Duration::minutes(2));
        let store = Arc::new(FakeStore { aws });
        let cache = ClientCache::new(
            Arc::new(FakeSts { calls: AtomicUsize::new(0) }),
            store,
            Arc::new(IdentityCipher),
            CredentialCacheConfig {
                mode: DeploymentMode::Production,
                owner_role_arn: None,
                owner_role_session_name: "owner".into(),
                owner_role_duration_seconds: 3600,
                owner_role_external_id: None,
                client_role_duration_seconds: 3600,
            },
        );

        let ws = Uuid::new_v4();
        let client = cache.get_client(ws, ClientKind::CloudWatchLogs).await.unwrap();
        assert!(client.as_cloudwatch_logs().is_some());
    }

    #[tokio::test]
    async fn clear_drops_matching_entries_only() {
        let aws = sample_integration(Utc::now() + chrono::Duration::hours(1));
        let cache = ClientCache::new(
            Arc::new(FakeSts { calls: AtomicUsize::new(0) }),
            Arc::new(FakeStore { aws }),
            Arc::new(IdentityCipher),
            CredentialCacheConfig {
                mode: DeploymentMode::Production,
                owner_role_arn: None,
                owner_role_session_name: "owner".into(),
                owner_role_duration_seconds: 3600,
                owner_role_external_id: None,
                client_role_duration_seconds: 3600,
            },
        );

        let ws = Uuid::new_v4();
        cache.get_client(ws, ClientKind::CloudWatchLogs).await.unwrap();
        cache.clear(Some(ws), None).await;
        let entries = cache.entries.read().await;
        assert!(entries.is_empty());
    }
}
