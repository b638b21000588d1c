use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),
}

/// Process-wide HTTP-layer configuration (base spec §6's API surface).
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    /// Shared secret protecting the review-trigger endpoint from random callers.
    pub trigger_secret: String,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: std::env::var("API_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            trigger_secret: std::env::var("REVIEW_TRIGGER_SECRET")
                .map_err(|_| ConfigError::MissingEnv("REVIEW_TRIGGER_SECRET"))?,
        })
    }
}
