use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-workspace role-assumption state. `access_key`/`secret`/`session_token`
/// are stored ciphertext; decryption happens at the credential-cache seam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsIntegration {
    pub workspace_id: Uuid,
    pub role_arn: String,
    pub encrypted_access_key: String,
    pub encrypted_secret_key: String,
    pub encrypted_session_token: String,
    pub credentials_expiration: chrono::DateTime<chrono::Utc>,
    pub region: String,
    pub encrypted_external_id: Option<String>,
    pub active: bool,
}

impl AwsIntegration {
    /// Per §4.2: a cached entry is reused iff its expiry is more than five
    /// minutes in the future.
    pub fn needs_refresh(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.credentials_expiration - now <= chrono::Duration::minutes(5)
    }
}

/// One of the three reqwest-speaking third-party observability providers a
/// workspace may wire up, per §3's "third-party integrations" list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThirdPartyProvider {
    Datadog,
    NewRelic,
    Grafana,
}

/// Per-workspace credentials for a Datadog/New Relic/Grafana integration.
/// Long-lived, unlike `AwsIntegration` — these providers are authenticated
/// with static API keys rather than assumed roles, so there is no expiry to
/// track here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThirdPartyIntegration {
    pub workspace_id: Uuid,
    pub provider: ThirdPartyProvider,
    pub base_url: String,
    pub encrypted_api_key: String,
    pub encrypted_app_key: Option<String>,
    pub active: bool,
}
