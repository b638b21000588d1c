//! Phase B — per-candidate-file extraction loop (base spec §4.6.2): one LLM
//! call per file, no tools, each independent and run under a bounded
//! concurrent join set since they share no state but the budget.

use std::sync::Arc;

use domain::ParsedFile;
use llm_budget::Budget;
use llm_port::{LlmPort, Profile};
use tokio::sync::Semaphore;

use crate::extraction::ExtractionRecord;

pub const MAX_LINES_PER_FILE: usize = 300;
const MAX_CONCURRENT_EXTRACTIONS: usize = 5;

/// Per-file extraction outcome: failures are logged and dropped, never
/// propagated — Phase B file failures are non-fatal per base spec §4.6.3.
pub async fn extract_all(
    llm: Arc<dyn LlmPort>,
    budget: Arc<Budget>,
    files: &[ParsedFile],
    candidate_paths: &[String],
) -> Vec<ExtractionRecord> {
    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_EXTRACTIONS));
    let mut set = tokio::task::JoinSet::new();

    for path in candidate_paths {
        let Some(file) = files.iter().find(|f| &f.file_path == path) else {
            continue;
        };
        let content = truncated_content(&file.content);
        let file_path = file.file_path.clone();
        let llm = Arc::clone(&llm);
        let budget = Arc::clone(&budget);
        let semaphore = Arc::clone(&semaphore);

        set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
            extract_one(llm.as_ref(), budget.as_ref(), &file_path, &content).await
        });
    }

    let mut extractions = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Some(mut file_extractions)) => extractions.append(&mut file_extractions),
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "Phase B extraction task panicked"),
        }
    }
    extractions
}

async fn extract_one(
    llm: &dyn LlmPort,
    budget: &Budget,
    file_path: &str,
    content: &str,
) -> Option<Vec<ExtractionRecord>> {
    if budget.check_before_start().is_err() {
        tracing::warn!(file_path, "Phase B extraction skipped: budget exhausted");
        return None;
    }

    let system_prompt = "You extract global observability instrumentation from a single source \
        file: HTTP metrics middleware, database instrumentation, tracing setup, error-handling, \
        and logging configuration. Respond with a JSON array of extractions, each with fields \
        type, file_path, function_or_class, coverage, metrics_recorded, registration_file, \
        description. An empty array is a valid answer when nothing relevant is present. Respond \
        with JSON only.";
    let user_prompt = format!("File: {file_path}\n\n{content}");

    let completion = match llm.invoke(Profile::Fast, system_prompt, &user_prompt).await {
        Ok(c) => c,
        Err(err) => {
            tracing::warn!(file_path, error = %err, "Phase B extraction call failed");
            return None;
        }
    };
    budget.record_completion(completion.tokens_used);

    parse_extractions(&completion.text, file_path)
}

fn parse_extractions(text: &str, file_path: &str) -> Option<Vec<ExtractionRecord>> {
    let cleaned = strip_code_fence(text);
    match serde_json::from_str::<Vec<ExtractionRecord>>(&cleaned) {
        Ok(records) => Some(records),
        Err(err) => {
            tracing::warn!(file_path, error = %err, "Phase B extraction returned malformed JSON");
            Some(Vec::new())
        }
    }
}

fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed)
        .strip_suffix("```")
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

fn truncated_content(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() <= MAX_LINES_PER_FILE {
        return content.to_string();
    }
    let mut truncated = lines[..MAX_LINES_PER_FILE].join("\n");
    truncated.push_str(&format!("\n... [truncated at {MAX_LINES_PER_FILE} lines]"));
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use llm_budget::BudgetConfig;
    use llm_port::{LlmCompletion, LlmPortError};
    use uuid::Uuid;

    struct FakeLlm(String);

    #[async_trait]
    impl LlmPort for FakeLlm {
        async fn invoke(&self, _: Profile, _: &str, _: &str) -> Result<LlmCompletion, LlmPortError> {
            Ok(LlmCompletion { text: self.0.clone(), tokens_used: 10 })
        }
    }

    fn file(path: &str, content: &str) -> ParsedFile {
        ParsedFile {
            repo_id: Uuid::new_v4(),
            file_path: path.to_string(),
            language: "python".to_string(),
            content: content.to_string(),
            line_count: content.lines().count() as u32,
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
            facts: Vec::new(),
        }
    }

    #[test]
    fn truncates_content_over_max_lines() {
        let content = (0..400).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let truncated = truncated_content(&content);
        assert!(truncated.contains("truncated at 300 lines"));
        assert_eq!(truncated.lines().count(), MAX_LINES_PER_FILE + 1);
    }

    #[test]
    fn short_content_is_untouched() {
        let content = "a\nb\nc";
        assert_eq!(truncated_content(content), content);
    }

    #[tokio::test]
    async fn extracts_from_every_candidate_file() {
        let llm: Arc<dyn LlmPort> = Arc::new(FakeLlm(
            r#"[{"type":"http_metrics","file_path":"middleware.py","function_or_class":"setup","coverage":"all_routes","metrics_recorded":["request_duration_seconds"],"registration_file":"app.py","description":"global middleware"}]"#
                .to_string(),
        ));
        let budget = Arc::new(Budget::new(BudgetConfig { max_iterations: 10, max_tokens: 10_000 }));
        let files = vec![file("middleware.py", "def setup(): pass")];
        let extractions = extract_all(llm, budget, &files, &["middleware.py".to_string()]).await;
        assert_eq!(extractions.len(), 1);
    }

    #[tokio::test]
    async fn malformed_json_drops_that_file_without_failing_the_loop() {
        let llm: Arc<dyn LlmPort> = Arc::new(FakeLlm("not json".to_string()));
        let budget = Arc::new(Budget::new(BudgetConfig { max_iterations: 10, max_tokens: 10_000 }));
        let files = vec![file("middleware.py", "def setup(): pass")];
        let extractions = extract_all(llm, budget, &files, &["middleware.py".to_string()]).await;
        assert!(extractions.is_empty());
    }

    #[tokio::test]
    async fn unknown_candidate_path_is_skipped() {
        let llm: Arc<dyn LlmPort> = Arc::new(FakeLlm("[]".to_string()));
        let budget = Arc::new(Budget::new(BudgetConfig { max_iterations: 10, max_tokens: 10_000 }));
        let files = vec![file("middleware.py", "content")];
        let extractions = extract_all(llm, budget, &files, &["missing.py".to_string()]).await;
        assert!(extractions.is_empty());
    }
}
