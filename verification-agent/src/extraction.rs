//! Phase B extraction records and Phase B' grouping into a `CodebaseContext`.

use domain::{CodebaseContext, GlobalInstrumentation};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionType {
    HttpMetrics,
    DbInstrumentation,
    Tracing,
    ErrorHandling,
    Logging,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionRecord {
    #[serde(rename = "type")]
    pub extraction_type: ExtractionType,
    pub file_path: String,
    pub function_or_class: Option<String>,
    pub coverage: String,
    #[serde(default)]
    pub metrics_recorded: Vec<String>,
    pub registration_file: Option<String>,
    pub description: String,
}

/// Groups every extraction by `type` into the structured context, unions
/// every `file_path`/`registration_file` into `infrastructure_files`, per
/// base spec §4.6.2 Phase B'.
pub fn build_context(
    workspace_id: Uuid,
    repo_full_name: String,
    commit_sha: String,
    extractions: &[ExtractionRecord],
) -> CodebaseContext {
    let mut global_http_metrics = Vec::new();
    let mut global_db_instrumentation = Vec::new();
    let mut global_tracing = Vec::new();
    let mut global_error_handling = Vec::new();
    let mut logging_framework = None;
    let mut infrastructure_files = std::collections::BTreeSet::new();

    for extraction in extractions {
        infrastructure_files.insert(extraction.file_path.clone());
        if let Some(reg) = &extraction.registration_file {
            infrastructure_files.insert(reg.clone());
        }

        let instrumentation = GlobalInstrumentation {
            file_path: extraction.file_path.clone(),
            instrumentation_type: describe_type(extraction.extraction_type),
            metrics_recorded: extraction.metrics_recorded.clone(),
            coverage: extraction.coverage.clone(),
            registration_file: extraction.registration_file.clone(),
            description: scoped_description(extraction),
        };

        match extraction.extraction_type {
            ExtractionType::HttpMetrics => global_http_metrics.push(instrumentation),
            ExtractionType::DbInstrumentation => global_db_instrumentation.push(instrumentation),
            ExtractionType::Tracing => global_tracing.push(instrumentation),
            ExtractionType::ErrorHandling => global_error_handling.push(instrumentation),
            ExtractionType::Logging => {
                if logging_framework.is_none() {
                    logging_framework = Some(scoped_description(extraction));
                }
            }
        }
    }

    let summary = format!(
        "{} global instrumentation point(s) discovered across {} file(s).",
        global_http_metrics.len() + global_db_instrumentation.len() + global_tracing.len() + global_error_handling.len(),
        infrastructure_files.len()
    );

    CodebaseContext {
        id: Uuid::new_v4(),
        workspace_id,
        repo_full_name,
        commit_sha,
        created_at: chrono::Utc::now(),
        global_http_metrics,
        global_db_instrumentation,
        global_tracing,
        global_error_handling,
        logging_framework,
        infrastructure_files: infrastructure_files.into_iter().collect(),
        summary,
    }
}

fn describe_type(extraction_type: ExtractionType) -> String {
    match extraction_type {
        ExtractionType::HttpMetrics => "http_metrics".to_string(),
        ExtractionType::DbInstrumentation => "db_instrumentation".to_string(),
        ExtractionType::Tracing => "tracing".to_string(),
        ExtractionType::ErrorHandling => "error_handling".to_string(),
        ExtractionType::Logging => "logging".to_string(),
    }
}

fn scoped_description(extraction: &ExtractionRecord) -> String {
    match &extraction.function_or_class {
        Some(scope) => format!("{scope}: {}", extraction.description),
        None => extraction.description.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extraction(extraction_type: ExtractionType, file: &str, coverage: &str) -> ExtractionRecord {
        ExtractionRecord {
            extraction_type,
            file_path: file.to_string(),
            function_or_class: Some("setup_middleware".to_string()),
            coverage: coverage.to_string(),
            metrics_recorded: vec!["request_duration_seconds".to_string()],
            registration_file: Some("app.py".to_string()),
            description: "registers request timing middleware".to_string(),
        }
    }

    #[test]
    fn groups_extractions_by_type() {
        let extractions = vec![
            extraction(ExtractionType::HttpMetrics, "middleware.py", "all_routes"),
            extraction(ExtractionType::DbInstrumentation, "db.py", "all_db_queries"),
        ];
        let ctx = build_context(Uuid::new_v4(), "acme/billing".to_string(), "sha".to_string(), &extractions);
        assert_eq!(ctx.global_http_metrics.len(), 1);
        assert_eq!(ctx.global_db_instrumentation.len(), 1);
        assert!(ctx.has_global_http_coverage());
        assert!(ctx.has_global_db_coverage());
    }

    #[test]
    fn infrastructure_files_unions_file_path_and_registration_file() {
        let extractions = vec![extraction(ExtractionType::Tracing, "tracing.py", "all_requests")];
        let ctx = build_context(Uuid::new_v4(), "acme/billing".to_string(), "sha".to_string(), &extractions);
        assert!(ctx.infrastructure_files.contains(&"tracing.py".to_string()));
        assert!(ctx.infrastructure_files.contains(&"app.py".to_string()));
    }

    #[test]
    fn logging_extraction_sets_framework_not_a_list() {
        let mut logging = extraction(ExtractionType::Logging, "logging_config.py", "all_requests");
        logging.description = "structlog JSON formatter configured globally".to_string();
        let ctx = build_context(Uuid::new_v4(), "acme/billing".to_string(), "sha".to_string(), &[logging]);
        assert!(ctx.logging_framework.unwrap().contains("structlog"));
    }

    #[test]
    fn empty_extractions_yield_empty_context() {
        let ctx = build_context(Uuid::new_v4(), "acme/billing".to_string(), "sha".to_string(), &[]);
        assert!(!ctx.has_global_http_coverage());
        assert!(!ctx.has_global_db_coverage());
        assert!(!ctx.has_global_error_coverage());
        assert!(ctx.infrastructure_files.is_empty());
    }
}
