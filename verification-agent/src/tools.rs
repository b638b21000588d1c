//! Read-only tools available to Phase C's verification agent.
//!
//! Grounded in `original_source`'s `_build_tools()` and base spec §4.6.2's
//! per-call truncation bounds: `read_file` to 15,000 chars, `search_files`
//! to 50 matches with a 200-char snippet, `list_files` to 50 paths.

use domain::ParsedFile;

pub const READ_FILE_MAX_CHARS: usize = 15_000;
pub const SEARCH_MAX_MATCHES: usize = 50;
pub const SEARCH_SNIPPET_RADIUS: usize = 100;
pub const LIST_FILES_MAX_PATHS: usize = 50;

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolCall {
    ReadFile { path: String },
    SearchFiles { keyword: String },
    ListFiles { glob_pattern: String },
}

/// Every tool call is independently logged, per base spec §4.6.2.
pub fn dispatch(files: &[ParsedFile], call: &ToolCall) -> String {
    match call {
        ToolCall::ReadFile { path } => {
            tracing::debug!(tool = "read_file", path, "agent tool call");
            read_file(files, path)
        }
        ToolCall::SearchFiles { keyword } => {
            tracing::debug!(tool = "search_files", keyword, "agent tool call");
            search_files(files, keyword)
        }
        ToolCall::ListFiles { glob_pattern } => {
            tracing::debug!(tool = "list_files", glob_pattern, "agent tool call");
            list_files(files, glob_pattern)
        }
    }
}

fn read_file(files: &[ParsedFile], path: &str) -> String {
    match files.iter().find(|f| f.file_path == path) {
        Some(f) if f.content.chars().count() > READ_FILE_MAX_CHARS => {
            let truncated: String = f.content.chars().take(READ_FILE_MAX_CHARS).collect();
            format!("{truncated}\n... [truncated at {READ_FILE_MAX_CHARS} characters]")
        }
        Some(f) => f.content.clone(),
        None => format!("error: no such file: {path}"),
    }
}

fn search_files(files: &[ParsedFile], keyword: &str) -> String {
    let needle = keyword.to_lowercase();
    let mut matches = Vec::new();

    'files: for file in files {
        let haystack = file.content.to_lowercase();
        let mut start = 0;
        while let Some(pos) = haystack[start..].find(&needle) {
            let idx = start + pos;
            let from = idx.saturating_sub(SEARCH_SNIPPET_RADIUS);
            let to = (idx + needle.len() + SEARCH_SNIPPET_RADIUS).min(file.content.len());
            let snippet: String = char_window(&file.content, from, to);
            matches.push(format!("{}: ...{}...", file.file_path, snippet));
            if matches.len() >= SEARCH_MAX_MATCHES {
                break 'files;
            }
            start = idx + needle.len();
        }
    }

    if matches.is_empty() {
        format!("no matches for \"{keyword}\"")
    } else {
        matches.join("\n")
    }
}

fn char_window(s: &str, from_byte: usize, to_byte: usize) -> String {
    let from = s.char_indices().map(|(i, _)| i).find(|&i| i >= from_byte).unwrap_or(s.len());
    let to = s.char_indices().map(|(i, _)| i).find(|&i| i >= to_byte).unwrap_or(s.len());
    let to = to.max(from);
    s[from..to].chars().take(2 * SEARCH_SNIPPET_RADIUS).collect()
}

fn list_files(files: &[ParsedFile], glob_pattern: &str) -> String {
    let pattern = glob_pattern.trim_end_matches("**").trim_end_matches('*');
    let paths: Vec<&str> = files
        .iter()
        .map(|f| f.file_path.as_str())
        .filter(|p| pattern.is_empty() || p.contains(pattern))
        .take(LIST_FILES_MAX_PATHS)
        .collect();

    if paths.is_empty() {
        format!("no files matching \"{glob_pattern}\"")
    } else {
        paths.join("\n")
    }
}
