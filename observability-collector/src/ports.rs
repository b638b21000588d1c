use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::types::{LogEntry, PartialMetrics};

#[derive(Debug, Clone)]
pub struct CollectionWindow {
    pub workspace_id: Uuid,
    pub service_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Remaining room in the shared `MAX_LOG_SAMPLES` budget when this
    /// provider is consulted; logs-only.
    pub remaining_log_budget: usize,
}

#[derive(Debug, Error)]
#[error("{provider} query failed: {message}")]
pub struct ProviderError {
    pub provider: &'static str,
    pub message: String,
}

impl ProviderError {
    pub fn new(provider: &'static str, message: impl Into<String>) -> Self {
        Self { provider, message: message.into() }
    }
}

#[async_trait]
pub trait LogsProvider: Send + Sync {
    async fn fetch_logs(&self, window: &CollectionWindow) -> Result<Vec<LogEntry>, ProviderError>;
}

#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn fetch_metrics(&self, window: &CollectionWindow) -> Result<PartialMetrics, ProviderError>;
}

pub(crate) fn detect_log_level(message: &str) -> String {
    let upper = message.to_uppercase();
    if upper.contains("ERROR") || upper.contains("EXCEPTION") {
        "ERROR".to_string()
    } else if upper.contains("WARN") {
        "WARN".to_string()
    } else if upper.contains("DEBUG") {
        "DEBUG".to_string()
    } else if upper.contains("TRACE") {
        "TRACE".to_string()
    } else {
        "INFO".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::detect_log_level;

    #[test]
    fn detects_error_before_other_levels() {
        assert_eq!(detect_log_level("an ERROR occurred"), "ERROR");
        assert_eq!(detect_log_level("WARN: retrying"), "WARN");
        assert_eq!(detect_log_level("just some info"), "INFO");
    }
}
