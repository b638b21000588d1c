//! Rule Engine (C4): pure, structural gap detection from parsed code facts.
//!
//! `evaluate` is a pure function — no I/O, no LLM — grounded in
//! `original_source/.../rule_engine/service.py::RuleEngineService.evaluate`.

mod fingerprint;
mod index;
pub mod red;
mod rules;

use std::collections::HashSet;

use domain::{DetectedProblem, ParsedFile, ProblemType};
use index::FactIndex;

pub use fingerprint::fingerprint;
pub use red::{assess as assess_red_readiness, RedDashboardReadiness};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct FactsSummary {
    pub total_functions: usize,
    pub total_classes: usize,
    pub total_try_blocks: usize,
    pub total_logging_calls: usize,
    pub total_metrics_calls: usize,
    pub total_http_handlers: usize,
    pub total_external_io: usize,
    pub total_imports: usize,
    pub total_files: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RuleEngineResult {
    pub logging_gaps: Vec<DetectedProblem>,
    pub metrics_gaps: Vec<DetectedProblem>,
    pub facts_summary: FactsSummary,
}

impl RuleEngineResult {
    pub fn all_gaps(&self) -> impl Iterator<Item = &DetectedProblem> {
        self.logging_gaps.iter().chain(self.metrics_gaps.iter())
    }

    pub fn gaps_count(&self) -> usize {
        self.logging_gaps.len() + self.metrics_gaps.len()
    }
}

/// Run every rule against `files`' facts and return the deduplicated,
/// fingerprint-ready result. Pure: no I/O, no LLM (base spec §4.4 contract).
pub fn evaluate(files: &[ParsedFile]) -> RuleEngineResult {
    let index = FactIndex::build(files);

    let mut logging_gaps = Vec::new();
    logging_gaps.extend(rules::rule_silent_exception(&index));
    logging_gaps.extend(rules::rule_http_handler_no_logging(&index));
    logging_gaps.extend(rules::rule_external_io_no_logging(&index));
    logging_gaps.extend(rules::rule_error_path_no_error_log(&index));
    logging_gaps.extend(rules::rule_large_function_no_logging(&index));

    let mut metrics_gaps = Vec::new();
    metrics_gaps.extend(rules::rule_http_handler_no_metrics(&index));
    metrics_gaps.extend(rules::rule_external_io_no_latency(&index));
    metrics_gaps.extend(rules::rule_no_business_metrics(&index));
    metrics_gaps.extend(rules::rule_error_no_counter(&index));

    let logging_gaps = dedup(logging_gaps);
    let metrics_gaps = dedup(metrics_gaps);

    let facts_summary = FactsSummary {
        total_functions: index.of_type(domain::FactType::Function).len(),
        total_classes: index.of_type(domain::FactType::Class).len(),
        total_try_blocks: index.of_type(domain::FactType::TryExcept).len(),
        total_logging_calls: index.of_type(domain::FactType::LoggingCall).len(),
        total_metrics_calls: index.of_type(domain::FactType::MetricsCall).len(),
        total_http_handlers: index.of_type(domain::FactType::HttpHandler).len(),
        total_external_io: index.of_type(domain::FactType::ExternalIo).len(),
        total_imports: index.of_type(domain::FactType::Import).len(),
        total_files: index.by_file.len(),
    };

    tracing::info!(
        logging_gaps = logging_gaps.len(),
        metrics_gaps = metrics_gaps.len(),
        files = facts_summary.total_files,
        "rule engine evaluated repository facts"
    );

    RuleEngineResult { logging_gaps, metrics_gaps, facts_summary }
}

/// Dedup key per base spec §4.4: `(rule_id, sorted files, sorted functions)`.
/// The first occurrence of a key is kept.
fn dedup(problems: Vec<DetectedProblem>) -> Vec<DetectedProblem> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(problems.len());
    for p in problems {
        if seen.insert(p.dedup_key()) {
            out.push(p);
        }
    }
    out
}

/// Filters gaps whose `rule_id` is suppressed by a fast-path codebase
/// context decision (C6 §4.6.1), dropping them from the result entirely —
/// suppressed gaps are never persisted as `false_alarm` (base spec §8).
pub fn suppress_rules(result: RuleEngineResult, suppressed: &HashSet<&str>) -> RuleEngineResult {
    if suppressed.is_empty() {
        return result;
    }
    let keep = |p: &DetectedProblem| !suppressed.contains(p.rule_id.as_str());
    RuleEngineResult {
        logging_gaps: result.logging_gaps.into_iter().filter(keep).collect(),
        metrics_gaps: result.metrics_gaps.into_iter().filter(keep).collect(),
        facts_summary: result.facts_summary,
    }
}

pub fn problem_type_of(rule_id: &str) -> ProblemType {
    if rule_id.starts_with("LOG") {
        ProblemType::LoggingGap
    } else {
        ProblemType::MetricsGap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_on_empty_repo_yields_no_gaps() {
        let result = evaluate(&[]);
        assert!(result.logging_gaps.is_empty());
        assert!(result.metrics_gaps.is_empty());
    }

    #[test]
    fn evaluate_is_deterministic_across_runs() {
        use domain::{CodeFact, FactType};
        use serde_json::json;
        use uuid::Uuid;

        let files = vec![ParsedFile {
            repo_id: Uuid::new_v4(),
            file_path: "svc.py".to_string(),
            language: "python".to_string(),
            content: String::new(),
            line_count: 60,
            functions: vec!["handler".to_string()],
            classes: Vec::new(),
            imports: Vec::new(),
            facts: vec![
                CodeFact {
                    fact_type: FactType::HttpHandler,
                    line_start: 1,
                    line_end: 60,
                    parent_function: None,
                    metadata: json!({"name": "handler", "kind": "GET"}),
                },
                CodeFact {
                    fact_type: FactType::TryExcept,
                    line_start: 10,
                    line_end: 20,
                    parent_function: Some("handler".to_string()),
                    metadata: json!({}),
                },
            ],
        }];

        let a = evaluate(&files);
        let b = evaluate(&files);
        let fps_a: Vec<_> = a.all_gaps().map(fingerprint).collect();
        let fps_b: Vec<_> = b.all_gaps().map(fingerprint).collect();
        assert_eq!(fps_a, fps_b);
        assert!(!fps_a.is_empty());
    }

    #[test]
    fn suppress_rules_drops_only_named_rule() {
        let result = RuleEngineResult {
            logging_gaps: vec![],
            metrics_gaps: vec![domain::DetectedProblem {
                rule_id: "MET_001".to_string(),
                problem_type: ProblemType::MetricsGap,
                severity: domain::Severity::High,
                title: "x".to_string(),
                category: "observability".to_string(),
                affected_files: vec!["a.py".to_string()],
                affected_functions: vec![],
                evidence: vec![],
                metric_type: None,
                suggested_metric_names: vec![],
            }],
            facts_summary: FactsSummary::default(),
        };
        let suppressed: HashSet<&str> = ["MET_001"].into_iter().collect();
        let filtered = suppress_rules(result, &suppressed);
        assert!(filtered.metrics_gaps.is_empty());
    }
}
