use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct TriggerReviewResponse {
    pub review_id: Uuid,
    pub success: bool,
    pub generation_duration_seconds: Option<u64>,
    pub error_message: Option<String>,
}
