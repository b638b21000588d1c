use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted LLM-derived description of a repository's observability
/// architecture at a given commit.
///
/// Invariant: at most one context is "current" per (workspace, repo) — the
/// most recently created row; older rows are retained for audit and are
/// never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodebaseContext {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub repo_full_name: String,
    pub commit_sha: String,
    pub created_at: chrono::DateTime<chrono::Utc>,

    pub global_http_metrics: Vec<GlobalInstrumentation>,
    pub global_db_instrumentation: Vec<GlobalInstrumentation>,
    pub global_tracing: Vec<GlobalInstrumentation>,
    pub global_error_handling: Vec<GlobalInstrumentation>,
    pub logging_framework: Option<String>,

    /// Paths whose change invalidates this context.
    pub infrastructure_files: Vec<String>,
    pub summary: String,
}

impl CodebaseContext {
    pub fn has_global_http_coverage(&self) -> bool {
        self.global_http_metrics
            .iter()
            .any(|i| matches!(i.coverage.as_str(), "all_routes" | "all_requests"))
    }

    pub fn has_global_db_coverage(&self) -> bool {
        !self.global_db_instrumentation.is_empty()
    }

    pub fn has_global_error_coverage(&self) -> bool {
        !self.global_error_handling.is_empty()
    }

    /// True iff any changed file path is one of this context's infrastructure files.
    pub fn invalidated_by(&self, changed_files: &[String]) -> bool {
        changed_files
            .iter()
            .any(|f| self.infrastructure_files.contains(f))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalInstrumentation {
    pub file_path: String,
    pub instrumentation_type: String,
    pub metrics_recorded: Vec<String>,
    /// One of `all_routes` | `all_db_queries` | `all_requests` | `specific_paths`.
    pub coverage: String,
    pub registration_file: Option<String>,
    pub description: String,
}
