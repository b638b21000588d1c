//! Contract for the external source-code parser. The core reads these
//! records; it never produces or mutates them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedRepository {
    pub workspace_id: Uuid,
    pub repo_full_name: String,
    pub commit_sha: String,
    pub status: RepoStatus,
    pub files: Vec<ParsedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedFile {
    pub repo_id: Uuid,
    pub file_path: String,
    pub language: String,
    pub content: String,
    pub line_count: u32,
    pub functions: Vec<String>,
    pub classes: Vec<String>,
    pub imports: Vec<String>,
    pub facts: Vec<CodeFact>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactType {
    Function,
    Class,
    TryExcept,
    LoggingCall,
    MetricsCall,
    HttpHandler,
    ExternalIo,
    Import,
}

/// A typed, located observation extracted from source.
///
/// Invariant: a non-function fact whose range lies inside exactly one
/// function has `parent_function` set to that function's name; line ranges
/// never cross file boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeFact {
    pub fact_type: FactType,
    pub line_start: u32,
    pub line_end: u32,
    pub parent_function: Option<String>,
    /// Type-specific metadata, e.g. `log_level` for `LoggingCall`, `kind` for `HttpHandler`.
    pub metadata: serde_json::Value,
}

impl CodeFact {
    /// `log_level` metadata read for `LoggingCall` facts, if present.
    pub fn log_level(&self) -> Option<&str> {
        self.metadata.get("log_level").and_then(|v| v.as_str())
    }

    pub fn contains_range(&self, line_start: u32, line_end: u32) -> bool {
        line_start >= self.line_start && line_end <= self.line_end
    }
}
