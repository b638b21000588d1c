//! Demo-mode mock analyzer (`USE_MOCK_LLM_ANALYZER`, base spec §4.8): a
//! deterministic stand-in for phases 3-7 that turns collected data straight
//! into plausible gaps, skipping the rule engine, verification, and
//! enrichment entirely. Grounded in `original_source/.../llm_analyzer/
//! service.py::MockLLMAnalyzer` — condensed to the structural shape (gaps
//! derived from collected errors/metrics, fingerprints and verdicts left
//! null) rather than its prose-generation detail, since none of that text
//! is asserted on by the base spec.

use domain::{MetricType, ProblemType, Severity};
use observability_collector::CollectedData;

#[derive(Debug, Clone)]
pub struct MockGap {
    pub problem_type: ProblemType,
    pub description: String,
    pub category: String,
    pub severity: Severity,
    pub affected_files: Vec<String>,
    pub affected_functions: Vec<String>,
    pub metric_type: Option<MetricType>,
    pub suggested_metric_names: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MockAnalysis {
    pub logging_gaps: Vec<MockGap>,
    pub metrics_gaps: Vec<MockGap>,
    pub summary: String,
    pub recommendations: String,
}

/// One logging gap per distinct error type observed (capped at 5), plus a
/// metrics gap when latency/error-rate metrics are entirely absent —
/// deterministic given `collected_data`, no randomness needed since the
/// input itself already varies per service/week.
pub fn analyze(service_name: &str, collected_data: &CollectedData) -> MockAnalysis {
    let logging_gaps: Vec<MockGap> = collected_data
        .errors
        .iter()
        .take(5)
        .map(|err| MockGap {
            problem_type: ProblemType::LoggingGap,
            description: format!("{} occurs {} time(s) without a structured error log", err.error_type, err.count),
            category: "error_handling".to_string(),
            severity: if err.count > 10 { Severity::High } else { Severity::Medium },
            affected_files: Vec::new(),
            affected_functions: Vec::new(),
            metric_type: None,
            suggested_metric_names: Vec::new(),
        })
        .collect();

    let mut metrics_gaps = Vec::new();
    if collected_data.metrics.latency_p99.is_none() {
        metrics_gaps.push(MockGap {
            problem_type: ProblemType::MetricsGap,
            description: "no p99 latency metric reported for this service".to_string(),
            category: "performance".to_string(),
            severity: Severity::Medium,
            affected_files: Vec::new(),
            affected_functions: Vec::new(),
            metric_type: Some(MetricType::Histogram),
            suggested_metric_names: vec!["request_duration_seconds".to_string()],
        });
    }
    if collected_data.metrics.error_rate.is_none() {
        metrics_gaps.push(MockGap {
            problem_type: ProblemType::MetricsGap,
            description: "no error-rate metric reported for this service".to_string(),
            category: "reliability".to_string(),
            severity: Severity::Medium,
            affected_files: Vec::new(),
            affected_functions: Vec::new(),
            metric_type: Some(MetricType::Counter),
            suggested_metric_names: vec!["requests_failed_total".to_string()],
        });
    }

    let gaps_count = logging_gaps.len() + metrics_gaps.len();
    let summary = format!(
        "Demo analysis for {service_name}: {gaps_count} observability gap(s) found across \
        {} collected log line(s) and {} distinct error type(s).",
        collected_data.log_count,
        collected_data.errors.len()
    );
    let recommendations = if gaps_count == 0 {
        "No immediate action required; observability coverage looks complete for this period.".to_string()
    } else {
        "Prioritize structured error logging for the highest-frequency error types and backfill \
        the missing golden-signal metrics."
            .to_string()
    };

    MockAnalysis { logging_gaps, metrics_gaps, summary, recommendations }
}
