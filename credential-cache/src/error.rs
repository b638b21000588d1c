use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialCacheError {
    #[error("failed to assume role {role_arn}: {source}")]
    AssumeRole {
        role_arn: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Per §4.2: a refresh failure aborts the dependent call without marking
    /// the integration inactive, so the caller can retry on the next review.
    #[error("credentials_refresh_failed: {0}")]
    CredentialsRefreshFailed(String),

    #[error("no active AWS integration for this workspace")]
    NoActiveIntegration,

    #[error("secret cipher failure: {0}")]
    Cipher(String),
}
