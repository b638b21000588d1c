/// Selects between the two-stage dev/staging flow (host → owner role →
/// client role) and the single-stage production flow (task role → client
/// role). Mirrors `settings.ENVIRONMENT` in `original_source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    DevOrStaging,
    Production,
}

impl DeploymentMode {
    pub fn from_env() -> Self {
        match std::env::var("ENVIRONMENT").unwrap_or_default().to_lowercase().as_str() {
            "dev" | "development" | "staging" => Self::DevOrStaging,
            _ => Self::Production,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CredentialCacheConfig {
    pub mode: DeploymentMode,
    pub owner_role_arn: Option<String>,
    pub owner_role_session_name: String,
    pub owner_role_duration_seconds: i32,
    pub owner_role_external_id: Option<String>,
    pub client_role_duration_seconds: i32,
}

impl CredentialCacheConfig {
    pub fn from_env() -> Self {
        Self {
            mode: DeploymentMode::from_env(),
            owner_role_arn: std::env::var("OWNER_ROLE_ARN").ok(),
            owner_role_session_name: std::env::var("OWNER_ROLE_SESSION_NAME")
                .unwrap_or_else(|_| "health-review-owner-session".to_string()),
            owner_role_duration_seconds: std::env::var("OWNER_ROLE_DURATION_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            owner_role_external_id: std::env::var("OWNER_ROLE_EXTERNAL_ID").ok(),
            client_role_duration_seconds: 3600,
        }
    }
}
