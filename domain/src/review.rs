use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use crate::gap::VerificationVerdict;
use crate::{gap::ReviewMetricsGap, gap::ReviewLoggingGap, sli::ReviewSli};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Generating,
    Completed,
    Failed,
}

impl ReviewStatus {
    /// Terminal statuses never transition back.
    pub fn is_terminal(self) -> bool {
        matches!(self, ReviewStatus::Completed | ReviewStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewError {
    pub id: Uuid,
    pub review_id: Uuid,
    pub fingerprint: String,
    pub error_type: String,
    pub message_sample: String,
    pub count: u64,
    pub first_seen: chrono::DateTime<chrono::Utc>,
    pub last_seen: chrono::DateTime<chrono::Utc>,
    pub endpoints: Vec<String>,
    pub stack_trace: Option<String>,
}

/// Parent aggregate for one review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceReview {
    pub id: Uuid,
    pub service_id: Uuid,
    pub workspace_id: Uuid,
    pub week_start: chrono::DateTime<chrono::Utc>,
    pub week_end: chrono::DateTime<chrono::Utc>,
    pub analyzed_commit_sha: Option<String>,
    pub codebase_changed: bool,
    pub status: ReviewStatus,
    pub overall_health_score: Option<u8>,
    pub summary: Option<String>,
    pub recommendations: Option<String>,
    pub generation_duration_seconds: Option<u64>,
    pub error_count_analyzed: u64,
    pub log_volume_analyzed: u64,
    pub metric_count_analyzed: u64,
    pub error_message: Option<String>,

    pub logging_gaps: Vec<ReviewLoggingGap>,
    pub metrics_gaps: Vec<ReviewMetricsGap>,
    pub slis: Vec<ReviewSli>,
    pub errors: Vec<ReviewError>,
}

impl ServiceReview {
    pub fn gaps_count(&self) -> usize {
        self.logging_gaps.len() + self.metrics_gaps.len()
    }
}
