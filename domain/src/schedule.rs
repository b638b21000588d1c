use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::review::ReviewStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSchedule {
    pub service_id: Uuid,
    pub next_due: chrono::DateTime<chrono::Utc>,
    pub last_review_id: Option<Uuid>,
    pub last_status: Option<ReviewStatus>,
    pub consecutive_failures: u32,
}

impl ReviewSchedule {
    pub fn record_success(&mut self, review_id: Uuid, generated_at: chrono::DateTime<chrono::Utc>) {
        self.last_review_id = Some(review_id);
        self.last_status = Some(ReviewStatus::Completed);
        self.consecutive_failures = 0;
        let _ = generated_at;
    }

    pub fn record_failure(&mut self, review_id: Uuid) {
        self.last_review_id = Some(review_id);
        self.last_status = Some(ReviewStatus::Failed);
        self.consecutive_failures += 1;
    }
}
