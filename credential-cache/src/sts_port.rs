//! The STS assume-role seam. Abstracted behind a trait so the two-stage
//! dev/staging flow and the single-stage production flow can be exercised in
//! tests without a real AWS account.
//!
//! Grounded in `original_source/app/aws/Integration/service.py`'s
//! `assume_owner_role`/`assume_role`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::bypass::LocalstackBypassGuard;
use crate::error::CredentialCacheError;

#[derive(Debug, Clone)]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AssumeRoleParams {
    pub role_arn: String,
    pub session_name: String,
    pub external_id: Option<String>,
    pub duration_seconds: i32,
    pub region: String,
    /// Credentials to assume *with*. `None` means "use the ambient AWS
    /// credential chain" (host env vars in dev, the ECS/EC2 task role in
    /// production); `Some` means "chain off a previously-assumed role"
    /// (owner → client, in the two-stage dev flow).
    pub base_credentials: Option<TemporaryCredentials>,
}

#[async_trait]
pub trait AwsStsPort: Send + Sync {
    async fn assume_role(
        &self,
        params: AssumeRoleParams,
    ) -> Result<TemporaryCredentials, CredentialCacheError>;
}

/// The real adapter, backed by `aws-sdk-sts`. Every call is wrapped in
/// [`LocalstackBypassGuard`]: STS (and CloudWatch, built from its output)
/// must always talk to real AWS, never the local emulator used elsewhere in
/// this stack for queue-style services.
pub struct StsAssumeRoleAdapter;

#[async_trait]
impl AwsStsPort for StsAssumeRoleAdapter {
    async fn assume_role(
        &self,
        params: AssumeRoleParams,
    ) -> Result<TemporaryCredentials, CredentialCacheError> {
        let _bypass = LocalstackBypassGuard::acquire();

        let region = aws_config::Region::new(params.region.clone());
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

        if let Some(base) = &params.base_credentials {
            let creds = aws_sdk_sts::config::Credentials::new(
                base.access_key_id.clone(),
                base.secret_access_key.clone(),
                Some(base.session_token.clone()),
                None,
                "credential-cache-owner-stage",
            );
            loader = loader.credentials_provider(creds);
        }

        let sdk_config = loader.load().await;
        let client = aws_sdk_sts::Client::new(&sdk_config);

        let mut request = client
            .assume_role()
            .role_arn(&params.role_arn)
            .role_session_name(&params.session_name)
            .duration_seconds(params.duration_seconds);
        if let Some(external_id) = &params.external_id {
            request = request.external_id(external_id);
        }

        let response = request.send().await.map_err(|e| CredentialCacheError::AssumeRole {
            role_arn: params.role_arn.clone(),
            source: Box::new(e),
        })?;

        let creds = response.credentials().ok_or_else(|| CredentialCacheError::AssumeRole {
            role_arn: params.role_arn.clone(),
            source: "assume_role response carried no credentials".into(),
        })?;

        let expiration = DateTime::from_timestamp(creds.expiration().secs(), 0)
            .unwrap_or_else(Utc::now);

        Ok(TemporaryCredentials {
            access_key_id: creds.access_key_id().to_string(),
            secret_access_key: creds.secret_access_key().to_string(),
            session_token: creds.session_token().to_string(),
            expiration,
        })
    }
}
