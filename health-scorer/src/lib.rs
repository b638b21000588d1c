//! Health Scorer + SLI Indicator (C7): deterministic scoring of collected
//! metrics and verified gap counts, plus per-indicator SLI calculation with
//! trend-vs-previous-review comparison.

mod mock;
mod score;
mod sli;

pub use mock::generate as generate_mock_slis;
pub use score::{calculate as calculate_health_scores, HealthScores};
pub use sli::{calculate as calculate_slis, previous_scores};
