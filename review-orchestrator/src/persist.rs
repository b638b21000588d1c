//! Phase 8 — builds the persisted `ServiceReview` tree from pipeline
//! outputs. Shared by the mock and real branches (base spec §4.8: "must
//! share the persistence path with the real branch").

use domain::{
    MetricType, ReviewError as ReviewErrorRecord, ReviewLoggingGap, ReviewMetricsGap, Severity, VerificationVerdict,
};
use observability_collector::ErrorData;
use uuid::Uuid;

use crate::enrichment::EnrichedGap;
use crate::mock_analyzer::MockGap;

#[allow(clippy::too_many_arguments)]
pub fn logging_gap_from_problem(
    review_id: Uuid,
    rule_id_title: &str,
    category: &str,
    severity: Severity,
    affected_files: Vec<String>,
    affected_functions: Vec<String>,
    evidence: Vec<String>,
    fingerprint: String,
    verdict: Option<VerificationVerdict>,
    enrichment: Option<&EnrichedGap>,
) -> ReviewLoggingGap {
    ReviewLoggingGap {
        id: Uuid::new_v4(),
        review_id,
        description: rule_id_title.to_string(),
        category: category.to_string(),
        severity,
        affected_files,
        affected_functions,
        suggested_log_statement: enrichment.and_then(|e| e.suggested_log_statement.clone()),
        implementation_guide: enrichment.and_then(|e| e.implementation_guide.clone()),
        example_code: enrichment.and_then(|e| e.example_code.clone()),
        rationale: enrichment.and_then(|e| e.rationale.clone()),
        gap_fingerprint: fingerprint,
        verification_verdict: verdict,
        evidence: serde_json::json!(evidence),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn metrics_gap_from_problem(
    review_id: Uuid,
    title: &str,
    category: &str,
    severity: Severity,
    affected_files: Vec<String>,
    affected_functions: Vec<String>,
    evidence: Vec<String>,
    metric_type: Option<MetricType>,
    suggested_metric_names: Vec<String>,
    fingerprint: String,
    verdict: Option<VerificationVerdict>,
    enrichment: Option<&EnrichedGap>,
) -> ReviewMetricsGap {
    ReviewMetricsGap {
        id: Uuid::new_v4(),
        review_id,
        description: title.to_string(),
        category: category.to_string(),
        severity,
        affected_files,
        affected_functions,
        metric_type,
        suggested_metric_names,
        implementation_guide: enrichment.and_then(|e| e.implementation_guide.clone()),
        example_code: enrichment.and_then(|e| e.example_code.clone()),
        rationale: enrichment.and_then(|e| e.rationale.clone()),
        gap_fingerprint: fingerprint,
        verification_verdict: verdict,
        evidence: serde_json::json!(evidence),
    }
}

pub fn mock_logging_gap(review_id: Uuid, gap: &MockGap) -> ReviewLoggingGap {
    ReviewLoggingGap {
        id: Uuid::new_v4(),
        review_id,
        description: gap.description.clone(),
        category: gap.category.clone(),
        severity: gap.severity,
        affected_files: gap.affected_files.clone(),
        affected_functions: gap.affected_functions.clone(),
        suggested_log_statement: None,
        implementation_guide: None,
        example_code: None,
        rationale: None,
        gap_fingerprint: String::new(),
        verification_verdict: None,
        evidence: serde_json::Value::Null,
    }
}

pub fn mock_metrics_gap(review_id: Uuid, gap: &MockGap) -> ReviewMetricsGap {
    ReviewMetricsGap {
        id: Uuid::new_v4(),
        review_id,
        description: gap.description.clone(),
        category: gap.category.clone(),
        severity: gap.severity,
        affected_files: gap.affected_files.clone(),
        affected_functions: gap.affected_functions.clone(),
        metric_type: gap.metric_type,
        suggested_metric_names: gap.suggested_metric_names.clone(),
        implementation_guide: None,
        example_code: None,
        rationale: None,
        gap_fingerprint: String::new(),
        verification_verdict: None,
        evidence: serde_json::Value::Null,
    }
}

pub fn error_record(review_id: Uuid, error: &ErrorData) -> ReviewErrorRecord {
    ReviewErrorRecord {
        id: Uuid::new_v4(),
        review_id,
        fingerprint: error.fingerprint.clone(),
        error_type: error.error_type.clone(),
        message_sample: error.message_sample.clone(),
        count: error.count,
        first_seen: error.first_seen,
        last_seen: error.last_seen,
        endpoints: error.endpoints.clone(),
        stack_trace: error.stack_trace.clone(),
    }
}
