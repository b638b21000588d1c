use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Request body for triggering one service's health review.
///
/// The scheduler that decides *when* a review is due is out of scope (base
/// spec §1); this endpoint just runs the pipeline for an already-identified
/// review/service pair, seeding both in the process-local stores if they
/// are not already known.
#[derive(Debug, Deserialize)]
pub struct TriggerReviewRequest {
    pub review_id: Uuid,
    pub service_id: Uuid,
    pub workspace_id: Uuid,
    pub service_name: String,
    pub repo_owner: Option<String>,
    pub repo_name: Option<String>,
    pub week_start: DateTime<Utc>,
    pub week_end: DateTime<Utc>,
    /// Shared secret used to protect the endpoint from unauthorized callers.
    pub secret: String,
}
