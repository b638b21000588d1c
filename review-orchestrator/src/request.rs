use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ReviewGenerationRequest {
    pub review_id: Uuid,
    pub service_id: Uuid,
    pub workspace_id: Uuid,
    pub week_start: chrono::DateTime<chrono::Utc>,
    pub week_end: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct ReviewGenerationResult {
    pub success: bool,
    pub review_id: Uuid,
    pub generation_duration_seconds: Option<u64>,
    pub error_message: Option<String>,
}
