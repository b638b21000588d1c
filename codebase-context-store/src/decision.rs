//! Fast-path reuse decision (base spec §4.6.1): whether a stored context is
//! still valid for a review, and which rule ids it suppresses when it is.

use domain::CodebaseContext;

/// A context is reusable when none of the files changed since the previous
/// review intersect its `infrastructure_files`.
pub fn is_reusable(context: &CodebaseContext, changed_files: &[String]) -> bool {
    !context.invalidated_by(changed_files)
}

/// Rule ids a reusable context suppresses deterministically, per its own
/// global-coverage predicates. MET_001 needs HTTP coverage, MET_002 needs DB
/// coverage, MET_004 needs error-handling coverage; MET_003 and every
/// logging rule are never suppressed by a context alone.
pub fn suppressed_rule_ids(context: &CodebaseContext) -> Vec<&'static str> {
    let mut suppressed = Vec::new();
    if context.has_global_http_coverage() {
        suppressed.push("MET_001");
    }
    if context.has_global_db_coverage() {
        suppressed.push("MET_002");
    }
    if context.has_global_error_coverage() {
        suppressed.push("MET_004");
    }
    suppressed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::GlobalInstrumentation;
    use uuid::Uuid;

    fn context() -> CodebaseContext {
        CodebaseContext {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            repo_full_name: "acme/billing".to_string(),
            commit_sha: "abc123".to_string(),
            created_at: Utc::now(),
            global_http_metrics: vec![GlobalInstrumentation {
                file_path: "middleware.py".to_string(),
                instrumentation_type: "http_middleware".to_string(),
                metrics_recorded: vec!["request_duration_seconds".to_string()],
                coverage: "all_routes".to_string(),
                registration_file: Some("app.py".to_string()),
                description: "global request middleware".to_string(),
            }],
            global_db_instrumentation: Vec::new(),
            global_tracing: Vec::new(),
            global_error_handling: Vec::new(),
            logging_framework: Some("structlog".to_string()),
            infrastructure_files: vec!["app.py".to_string(), "middleware.py".to_string()],
            summary: "Global HTTP middleware covers all routes.".to_string(),
        }
    }

    #[test]
    fn reusable_when_changed_files_miss_infrastructure() {
        let ctx = context();
        assert!(is_reusable(&ctx, &["payments/handler.py".to_string()]));
    }

    #[test]
    fn not_reusable_when_infrastructure_file_changed() {
        let ctx = context();
        assert!(!is_reusable(&ctx, &["app.py".to_string()]));
    }

    #[test]
    fn suppresses_only_covered_rules() {
        let ctx = context();
        assert_eq!(suppressed_rule_ids(&ctx), vec!["MET_001"]);
    }
}
