use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
    pub attributes: HashMap<String, String>,
}

/// Per-provider partial readout of the fixed golden-signal set; `None` means
/// "this provider had nothing for this field", not "the value is zero".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialMetrics {
    pub latency_p50: Option<f64>,
    pub latency_p99: Option<f64>,
    pub error_rate: Option<f64>,
    pub availability: Option<f64>,
    pub throughput_per_minute: Option<f64>,
}

impl PartialMetrics {
    /// First-wins merge: fields already set on `self` are never overwritten.
    pub fn merge_from(&mut self, other: PartialMetrics) {
        self.latency_p50 = self.latency_p50.or(other.latency_p50);
        self.latency_p99 = self.latency_p99.or(other.latency_p99);
        self.error_rate = self.error_rate.or(other.error_rate);
        self.availability = self.availability.or(other.availability);
        self.throughput_per_minute = self.throughput_per_minute.or(other.throughput_per_minute);
    }

    pub fn non_null_count(&self) -> usize {
        [
            self.latency_p50.is_some(),
            self.latency_p99.is_some(),
            self.error_rate.is_some(),
            self.availability.is_some(),
            self.throughput_per_minute.is_some(),
        ]
        .into_iter()
        .filter(|v| *v)
        .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorData {
    pub fingerprint: String,
    pub error_type: String,
    pub message_sample: String,
    pub count: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub endpoints: Vec<String>,
    pub stack_trace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedData {
    pub logs: Vec<LogEntry>,
    pub log_count: usize,
    pub metrics: PartialMetrics,
    pub metric_count: usize,
    pub errors: Vec<ErrorData>,
}
