use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    LoggingGap,
    MetricsGap,
}

/// Distinguishes `counter`/`histogram`/`gauge` for enrichment prompting only;
/// not used by scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Counter,
    Histogram,
    Gauge,
}

/// Raw output of the rule engine (C4), before persistence or verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedProblem {
    pub rule_id: String,
    pub problem_type: ProblemType,
    pub severity: Severity,
    pub title: String,
    pub category: String,
    pub affected_files: Vec<String>,
    pub affected_functions: Vec<String>,
    pub evidence: Vec<String>,
    pub metric_type: Option<MetricType>,
    pub suggested_metric_names: Vec<String>,
}

impl DetectedProblem {
    /// Deterministic dedup key: `(rule_id, sorted files, sorted functions)`.
    pub fn dedup_key(&self) -> (String, Vec<String>, Vec<String>) {
        let mut files = self.affected_files.clone();
        let mut functions = self.affected_functions.clone();
        files.sort();
        functions.sort();
        (self.rule_id.clone(), files, functions)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationVerdict {
    Genuine,
    FalseAlarm,
    CoveredGlobally,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewLoggingGap {
    pub id: Uuid,
    pub review_id: Uuid,
    pub description: String,
    pub category: String,
    pub severity: Severity,
    pub affected_files: Vec<String>,
    pub affected_functions: Vec<String>,
    pub suggested_log_statement: Option<String>,
    pub implementation_guide: Option<String>,
    pub example_code: Option<String>,
    pub rationale: Option<String>,
    pub gap_fingerprint: String,
    pub verification_verdict: Option<VerificationVerdict>,
    pub evidence: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewMetricsGap {
    pub id: Uuid,
    pub review_id: Uuid,
    pub description: String,
    pub category: String,
    pub severity: Severity,
    pub affected_files: Vec<String>,
    pub affected_functions: Vec<String>,
    pub metric_type: Option<MetricType>,
    pub suggested_metric_names: Vec<String>,
    pub implementation_guide: Option<String>,
    pub example_code: Option<String>,
    pub rationale: Option<String>,
    pub gap_fingerprint: String,
    pub verification_verdict: Option<VerificationVerdict>,
    pub evidence: serde_json::Value,
}
