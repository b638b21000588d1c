//! Phase A — candidate file identification (base spec §4.6.2): one LLM
//! call, no tools, returning at most 30 paths likely to hold middleware,
//! instrumentation, logging, error-handling, or tracing configuration.

use llm_budget::Budget;
use llm_port::{LlmPort, Profile};

use crate::error::VerificationError;
use crate::tree::{self, TreeEntry};

const MAX_CANDIDATES: usize = 30;

pub async fn identify_candidates(
    llm: &dyn LlmPort,
    budget: &Budget,
    entries: &[TreeEntry],
    rule_ids: &[String],
) -> Result<Vec<String>, VerificationError> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    budget.check_before_start()?;

    let system_prompt = "You are identifying which files in a repository are most likely to \
        contain global HTTP middleware, metrics instrumentation, structured logging setup, \
        error-handling, or distributed tracing configuration. Respond with a JSON array of at \
        most 30 file paths, most likely first. Respond with JSON only.";
    let user_prompt = format!(
        "Rule ids under review: {}\n\nRepository file tree:\n{}",
        rule_ids.join(", "),
        tree::format_tree(entries)
    );

    let completion = llm.invoke(Profile::Fast, system_prompt, &user_prompt).await?;
    budget.record_completion(completion.tokens_used);

    let known = tree::known_paths(entries);
    let candidates = parse_candidate_paths(&completion.text);

    Ok(candidates
        .into_iter()
        .filter(|p| known.contains(p.as_str()))
        .take(MAX_CANDIDATES)
        .collect())
}

/// Malformed JSON yields no candidates — Phase A failure per base spec
/// §4.6.3 ("no candidates → an empty context is written").
fn parse_candidate_paths(text: &str) -> Vec<String> {
    let cleaned = strip_code_fence(text);
    serde_json::from_str::<Vec<String>>(&cleaned).unwrap_or_default()
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
