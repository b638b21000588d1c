use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventType {
    PromptInjection,
    GuardDegraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Audit record written whenever C9 rejects input or its classifier degrades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: Uuid,
    pub event_type: SecurityEventType,
    pub severity: EventSeverity,
    pub workspace_id: Option<Uuid>,
    /// Truncated to 200 chars.
    pub message_preview: String,
    /// Raw "true"/"false"/absent from the guard's LLM call.
    pub guard_response: Option<String>,
    pub reason: String,
    pub event_metadata: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl SecurityEvent {
    pub fn truncate_preview(message: &str) -> String {
        message.chars().take(200).collect()
    }
}
