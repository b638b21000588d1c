use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    /// `UP` if `current - previous > 5`, `DOWN` if `< -5`, `STABLE` otherwise.
    pub fn from_delta(current: f64, previous: f64) -> Trend {
        let delta = current - previous;
        if delta > 5.0 {
            Trend::Up
        } else if delta < -5.0 {
            Trend::Down
        } else {
            Trend::Stable
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSli {
    pub id: Uuid,
    pub review_id: Uuid,
    pub name: String,
    pub category: String,
    pub score: u8,
    pub previous_score: Option<u8>,
    pub trend: Option<Trend>,
    pub target: String,
    pub actual: String,
    pub unit: String,
    pub data_source: String,
}
