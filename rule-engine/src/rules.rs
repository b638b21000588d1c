//! Deterministic rules for detecting logging and metrics gaps (base spec §4.4).
//!
//! Each rule is a predicate over the [`FactIndex`] producing zero or more
//! [`DetectedProblem`]s. No I/O, no LLM — `original_source`'s filtered
//! `rule_engine/rules.py` kept only type aliases, so the trigger table in
//! base spec §4.4 is authoritative here rather than a transcription of the
//! Python bodies.

use domain::{DetectedProblem, FactType, MetricType, ProblemType, Severity};

use crate::index::FactIndex;

const MIN_LARGE_FUNCTION_LINES: u32 = 50;
const ERROR_LOG_LEVELS: [&str; 4] = ["error", "exception", "critical", "fatal"];

fn problem(
    rule_id: &str,
    problem_type: ProblemType,
    severity: Severity,
    title: impl Into<String>,
    category: &str,
    affected_files: Vec<String>,
    affected_functions: Vec<String>,
) -> DetectedProblem {
    DetectedProblem {
        rule_id: rule_id.to_string(),
        problem_type,
        severity,
        title: title.into(),
        category: category.to_string(),
        affected_files,
        affected_functions,
        evidence: Vec::new(),
        metric_type: None,
        suggested_metric_names: Vec::new(),
    }
}

/// LOG_001 (HIGH): try/except block contains no `logging_call` fact in its line range.
pub fn rule_silent_exception(index: &FactIndex) -> Vec<DetectedProblem> {
    let mut out = Vec::new();
    for try_except in index.of_type(FactType::TryExcept) {
        let covered = index.contained_in(try_except.file_path, try_except, FactType::LoggingCall);
        if covered.is_empty() {
            out.push(problem(
                "LOG_001",
                ProblemType::LoggingGap,
                Severity::High,
                format!(
                    "Silent exception handling in {}",
                    try_except.fact.parent_function.as_deref().unwrap_or("<module scope>")
                ),
                "error_handling",
                vec![try_except.file_path.to_string()],
                try_except.fact.parent_function.iter().map(|s| s.to_string()).collect(),
            ));
        }
    }
    out
}

/// LOG_002 (MEDIUM): http_handler function contains no `logging_call`.
pub fn rule_http_handler_no_logging(index: &FactIndex) -> Vec<DetectedProblem> {
    let mut out = Vec::new();
    for handler in index.of_type(FactType::HttpHandler) {
        let covered = index.contained_in(handler.file_path, handler, FactType::LoggingCall);
        if covered.is_empty() {
            out.push(problem(
                "LOG_002",
                ProblemType::LoggingGap,
                Severity::Medium,
                format!(
                    "HTTP handler {} has no logging",
                    handler.scope_name().unwrap_or("<anonymous>")
                ),
                "observability",
                vec![handler.file_path.to_string()],
                handler.scope_name().map(|s| s.to_string()).into_iter().collect(),
            ));
        }
    }
    out
}

/// LOG_003 (MEDIUM): function containing an `external_io` fact has no `logging_call`.
pub fn rule_external_io_no_logging(index: &FactIndex) -> Vec<DetectedProblem> {
    let mut out = Vec::new();
    for io in index.of_type(FactType::ExternalIo) {
        let scope = io.fact.parent_function.as_deref();
        let covered = index.in_same_scope(io.file_path, scope, FactType::LoggingCall);
        if covered.is_empty() {
            out.push(problem(
                "LOG_003",
                ProblemType::LoggingGap,
                Severity::Medium,
                format!(
                    "External I/O in {} has no logging",
                    scope.unwrap_or("<module scope>")
                ),
                "observability",
                vec![io.file_path.to_string()],
                scope.map(|s| s.to_string()).into_iter().collect(),
            ));
        }
    }
    out
}

/// LOG_004 (MEDIUM): function contains a try/except but no `logging_call` at
/// error severity anywhere in the function's scope.
pub fn rule_error_path_no_error_log(index: &FactIndex) -> Vec<DetectedProblem> {
    let mut out = Vec::new();
    for try_except in index.of_type(FactType::TryExcept) {
        let scope = try_except.fact.parent_function.as_deref();
        let has_error_log = index
            .in_same_scope(try_except.file_path, scope, FactType::LoggingCall)
            .iter()
            .any(|lc| {
                lc.fact
                    .log_level()
                    .map(|lvl| ERROR_LOG_LEVELS.contains(&lvl.to_lowercase().as_str()))
                    .unwrap_or(false)
            });
        if !has_error_log {
            out.push(problem(
                "LOG_004",
                ProblemType::LoggingGap,
                Severity::Medium,
                format!(
                    "{} handles errors without an error-level log",
                    scope.unwrap_or("<module scope>")
                ),
                "error_handling",
                vec![try_except.file_path.to_string()],
                scope.map(|s| s.to_string()).into_iter().collect(),
            ));
        }
    }
    out
}

/// LOG_005 (LOW): function >= 50 lines has no `logging_call`.
pub fn rule_large_function_no_logging(index: &FactIndex) -> Vec<DetectedProblem> {
    let mut out = Vec::new();
    for function in index.of_type(FactType::Function) {
        if function.line_count() < MIN_LARGE_FUNCTION_LINES {
            continue;
        }
        let covered = index.contained_in(function.file_path, function, FactType::LoggingCall);
        if covered.is_empty() {
            out.push(problem(
                "LOG_005",
                ProblemType::LoggingGap,
                Severity::Low,
                format!(
                    "Large function {} ({} lines) has no logging",
                    function.name().unwrap_or("<anonymous>"),
                    function.line_count()
                ),
                "observability",
                vec![function.file_path.to_string()],
                function.name().map(|s| s.to_string()).into_iter().collect(),
            ));
        }
    }
    out
}

/// MET_001 (HIGH): file contains `http_handler` facts but zero `metrics_call`
/// facts anywhere in the file.
pub fn rule_http_handler_no_metrics(index: &FactIndex) -> Vec<DetectedProblem> {
    let mut out = Vec::new();
    for file_path in index.file_paths() {
        let handlers: Vec<_> = index
            .in_file(file_path)
            .iter()
            .filter(|f| f.fact.fact_type == FactType::HttpHandler)
            .copied()
            .collect();
        if handlers.is_empty() {
            continue;
        }
        let has_metrics = index
            .in_file(file_path)
            .iter()
            .any(|f| f.fact.fact_type == FactType::MetricsCall);
        if !has_metrics {
            let mut functions: Vec<String> =
                handlers.iter().filter_map(|h| h.scope_name()).map(str::to_string).collect();
            functions.sort();
            functions.dedup();
            out.push(problem(
                "MET_001",
                ProblemType::MetricsGap,
                Severity::High,
                format!("{file_path} has HTTP handlers with no metrics instrumentation"),
                "observability",
                vec![file_path.to_string()],
                functions,
            ));
        }
    }
    out
}

/// MET_002 (MEDIUM): function with `external_io` has no `metrics_call`.
pub fn rule_external_io_no_latency(index: &FactIndex) -> Vec<DetectedProblem> {
    let mut out = Vec::new();
    for io in index.of_type(FactType::ExternalIo) {
        let scope = io.fact.parent_function.as_deref();
        let covered = index.in_same_scope(io.file_path, scope, FactType::MetricsCall);
        if covered.is_empty() {
            let mut problem_ = problem(
                "MET_002",
                ProblemType::MetricsGap,
                Severity::Medium,
                format!(
                    "External I/O in {} has no latency metric",
                    scope.unwrap_or("<module scope>")
                ),
                "performance",
                vec![io.file_path.to_string()],
                scope.map(|s| s.to_string()).into_iter().collect(),
            );
            problem_.metric_type = Some(MetricType::Histogram);
            problem_.suggested_metric_names = vec!["external_io_duration_seconds".to_string()];
            out.push(problem_);
        }
    }
    out
}

/// MET_003 (HIGH): the repository has >= 1 function and zero `metrics_call`
/// facts overall.
pub fn rule_no_business_metrics(index: &FactIndex) -> Vec<DetectedProblem> {
    let has_functions = !index.of_type(FactType::Function).is_empty();
    let has_metrics = !index.of_type(FactType::MetricsCall).is_empty();
    if !has_functions || has_metrics {
        return Vec::new();
    }

    let mut files: Vec<String> = index.file_paths().map(str::to_string).collect();
    files.sort();

    vec![problem(
        "MET_003",
        ProblemType::MetricsGap,
        Severity::High,
        "No metrics instrumentation found anywhere in the repository",
        "observability",
        files,
        Vec::new(),
    )]
}

/// MET_004 (LOW): function contains a try/except but no `metrics_call` in scope.
pub fn rule_error_no_counter(index: &FactIndex) -> Vec<DetectedProblem> {
    let mut out = Vec::new();
    for try_except in index.of_type(FactType::TryExcept) {
        let scope = try_except.fact.parent_function.as_deref();
        let covered = index.in_same_scope(try_except.file_path, scope, FactType::MetricsCall);
        if covered.is_empty() {
            let mut problem_ = problem(
                "MET_004",
                ProblemType::MetricsGap,
                Severity::Low,
                format!(
                    "{} handles errors without an error counter",
                    scope.unwrap_or("<module scope>")
                ),
                "error_handling",
                vec![try_except.file_path.to_string()],
                scope.map(|s| s.to_string()).into_iter().collect(),
            );
            problem_.metric_type = Some(MetricType::Counter);
            problem_.suggested_metric_names = vec!["errors_total".to_string()];
            out.push(problem_);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{CodeFact, ParsedFile};
    use serde_json::json;
    use uuid::Uuid;

    fn fact(fact_type: FactType, start: u32, end: u32, parent: Option<&str>, metadata: serde_json::Value) -> CodeFact {
        CodeFact {
            fact_type,
            line_start: start,
            line_end: end,
            parent_function: parent.map(str::to_string),
            metadata,
        }
    }

    fn file(path: &str, facts: Vec<CodeFact>) -> ParsedFile {
        ParsedFile {
            repo_id: Uuid::new_v4(),
            file_path: path.to_string(),
            language: "python".to_string(),
            content: String::new(),
            line_count: 100,
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
            facts,
        }
    }

    /// Scenario 1 from base spec §8: one silent try/except, nothing else.
    #[test]
    fn silent_exception_scenario() {
        let files = vec![file(
            "pay.py",
            vec![
                fact(FactType::Function, 10, 40, None, json!({"name": "handle_payment"})),
                fact(FactType::TryExcept, 20, 30, Some("handle_payment"), json!({})),
            ],
        )];
        let index = FactIndex::build(&files);

        let gaps = rule_silent_exception(&index);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].rule_id, "LOG_001");
        assert_eq!(gaps[0].affected_files, vec!["pay.py"]);
        assert_eq!(gaps[0].affected_functions, vec!["handle_payment"]);
        assert_eq!(gaps[0].severity, Severity::High);
    }

    #[test]
    fn logged_exception_produces_no_gap() {
        let files = vec![file(
            "pay.py",
            vec![
                fact(FactType::Function, 10, 40, None, json!({"name": "handle_payment"})),
                fact(FactType::TryExcept, 20, 30, Some("handle_payment"), json!({})),
                fact(
                    FactType::LoggingCall,
                    25,
                    25,
                    Some("handle_payment"),
                    json!({"log_level": "error"}),
                ),
            ],
        )];
        let index = FactIndex::build(&files);
        assert!(rule_silent_exception(&index).is_empty());
        assert!(rule_error_path_no_error_log(&index).is_empty());
    }

    #[test]
    fn met_003_requires_functions_and_no_metrics_anywhere() {
        let files = vec![file(
            "a.py",
            vec![fact(FactType::Function, 1, 5, None, json!({"name": "f"}))],
        )];
        let index = FactIndex::build(&files);
        let gaps = rule_no_business_metrics(&index);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].rule_id, "MET_003");
        assert!(gaps[0].affected_functions.is_empty());
    }

    #[test]
    fn met_003_skips_when_metrics_present() {
        let files = vec![file(
            "a.py",
            vec![
                fact(FactType::Function, 1, 5, None, json!({"name": "f"})),
                fact(FactType::MetricsCall, 2, 2, Some("f"), json!({})),
            ],
        )];
        let index = FactIndex::build(&files);
        assert!(rule_no_business_metrics(&index).is_empty());
    }

    #[test]
    fn empty_fact_set_yields_no_gaps() {
        let files: Vec<ParsedFile> = vec![file("empty.py", vec![])];
        let index = FactIndex::build(&files);
        assert!(rule_silent_exception(&index).is_empty());
        assert!(rule_http_handler_no_logging(&index).is_empty());
        assert!(rule_http_handler_no_metrics(&index).is_empty());
        assert!(rule_no_business_metrics(&index).is_empty());
    }

    #[test]
    fn met_001_flags_file_with_handlers_and_no_metrics() {
        let files = vec![file(
            "routes.py",
            vec![
                fact(FactType::HttpHandler, 1, 10, None, json!({"name": "get_users", "kind": "GET"})),
                fact(FactType::HttpHandler, 12, 20, None, json!({"name": "post_users", "kind": "POST"})),
            ],
        )];
        let index = FactIndex::build(&files);
        let gaps = rule_http_handler_no_metrics(&index);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].affected_functions, vec!["get_users", "post_users"]);
    }
}
