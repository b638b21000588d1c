use serde::Deserialize;
use uuid::Uuid;

/// Request body for validating a user-originated message through the
/// prompt injection guard (C9) before it reaches any downstream component.
#[derive(Debug, Deserialize)]
pub struct ValidateMessageRequest {
    pub message: String,
    pub context: Option<String>,
    pub workspace_id: Option<Uuid>,
}
