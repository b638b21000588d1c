//! Phase C — sample-based gap verification (base spec §4.6.2).
//!
//! Re-architected per base spec §9 Design Notes: the tool-use loop is an
//! explicit state machine over `(pending_tool_calls, completed_tool_calls,
//! max_steps_remaining)`, not a hidden driver loop inside the LLM client.
//!
//! ```text
//!   sample_selected
//!        │
//!        ▼
//!   agent_running ──► parse_error ──► group = genuine (terminal)
//!        │
//!        ▼
//!   verdicts_parsed
//!        │
//!        ├── pass_ratio ≥ 0.70 ──► group = false_alarm (terminal)
//!        └── pass_ratio < 0.70 ──► group = genuine      (terminal)
//! ```

use domain::{CodebaseContext, ParsedFile, VerificationVerdict};
use llm_budget::Budget;
use llm_port::{LlmCompletion, LlmPort, Profile};
use serde::Deserialize;

use crate::tools::{self, ToolCall};

pub const VERIFICATION_SAMPLE_SIZE: usize = 20;
pub const VERIFICATION_CONFIDENCE_THRESHOLD: f64 = 0.70;
const MAX_AGENT_STEPS: u32 = 6;

#[derive(Debug, Clone)]
pub struct GapSample {
    pub gap_title: String,
    pub affected_files: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GapVerdict {
    pub gap_title: String,
    pub verdict: PassFail,
    pub reason: String,
    pub evidence_file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassFail {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    SampleSelected,
    AgentRunning,
    VerdictsParsed,
}

#[derive(Debug, Clone)]
pub struct RuleGroupOutcome {
    pub verdict: VerificationVerdict,
    pub pass_ratio: Option<f64>,
    pub per_gap: Vec<GapVerdict>,
}

/// Runs one rule group (all gaps sharing a `rule_id`) through Phase C.
/// Per-group failures are non-fatal: any parse/step-exhaustion failure
/// defaults the whole group to `genuine` (base spec §4.6.3).
pub async fn verify_rule_group(
    llm: &dyn LlmPort,
    budget: &Budget,
    context: &CodebaseContext,
    files: &[ParsedFile],
    rule_id: &str,
    all_gaps: &[GapSample],
) -> RuleGroupOutcome {
    let mut state = AgentState::SampleSelected;
    let sample: Vec<&GapSample> = all_gaps.iter().take(VERIFICATION_SAMPLE_SIZE).collect();
    tracing::debug!(rule_id, sample_size = sample.len(), ?state, "Phase C sample selected");

    state = AgentState::AgentRunning;
    let mut transcript = vec![(Role::System, system_prompt(context)), (Role::User, user_prompt(rule_id, &sample))];

    for step in 0..MAX_AGENT_STEPS {
        if budget.check_before_start().is_err() {
            tracing::warn!(rule_id, "Phase C budget exhausted mid-loop; defaulting group to genuine");
            return genuine_outcome();
        }

        let completion = match call(llm, &transcript).await {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(rule_id, error = %err, "Phase C agent call failed; defaulting to genuine");
                return genuine_outcome();
            }
        };
        budget.record_completion(completion.tokens_used);

        if let Some(verdicts) = try_parse_verdicts(&completion.text) {
            state = AgentState::VerdictsParsed;
            tracing::debug!(rule_id, ?state, returned = verdicts.len(), "Phase C verdicts parsed");
            return decide(rule_id, verdicts);
        }

        if let Some(call) = try_parse_tool_call(&completion.text) {
            let result = tools::dispatch(files, &call);
            transcript.push((Role::Assistant, completion.text));
            transcript.push((Role::User, format!("Tool result:\n{result}")));
            continue;
        }

        tracing::warn!(rule_id, step, "Phase C agent returned unparseable output; defaulting to genuine");
        return genuine_outcome();
    }

    tracing::warn!(rule_id, "Phase C agent exhausted its step cap; defaulting to genuine");
    genuine_outcome()
}

fn decide(rule_id: &str, verdicts: Vec<GapVerdict>) -> RuleGroupOutcome {
    let total_returned = verdicts.len();
    if total_returned == 0 {
        return genuine_outcome();
    }
    let pass_count = verdicts.iter().filter(|v| v.verdict == PassFail::Pass).count();
    let pass_ratio = pass_count as f64 / total_returned as f64;

    let verdict = if pass_ratio >= VERIFICATION_CONFIDENCE_THRESHOLD {
        VerificationVerdict::FalseAlarm
    } else {
        VerificationVerdict::Genuine
    };
    tracing::info!(rule_id, pass_ratio, ?verdict, "Phase C group decision");

    RuleGroupOutcome { verdict, pass_ratio: Some(pass_ratio), per_gap: verdicts }
}

fn genuine_outcome() -> RuleGroupOutcome {
    RuleGroupOutcome { verdict: VerificationVerdict::Genuine, pass_ratio: None, per_gap: Vec::new() }
}

#[derive(Debug, Clone, Copy)]
enum Role {
    System,
    User,
    Assistant,
}

async fn call(llm: &dyn LlmPort, transcript: &[(Role, String)]) -> Result<LlmCompletion, llm_port::LlmPortError> {
    let system = transcript
        .iter()
        .find(|(role, _)| matches!(role, Role::System))
        .map(|(_, text)| text.as_str())
        .unwrap_or_default();
    let conversation = transcript
        .iter()
        .filter(|(role, _)| !matches!(role, Role::System))
        .map(|(role, text)| format!("[{role:?}]\n{text}"))
        .collect::<Vec<_>>()
        .join("\n\n");
    llm.invoke(Profile::Slow, system, &conversation).await
}

fn system_prompt(context: &CodebaseContext) -> String {
    format!(
        "You verify whether detected logging/metrics gaps are genuine or already covered by \
        existing global instrumentation. Codebase context:\n{}\n\n\
        For each sample gap, trace its affected endpoint or function back to a router or \
        application entry point and decide whether any infrastructure from the context above \
        sits in its request path. You may call tools: read_file(path), search_files(keyword), \
        list_files(glob_pattern) — respond with JSON `{{\"tool\": \"read_file\", \"path\": \"...\"}}` \
        (or search_files/list_files). When ready, respond with a final JSON array of \
        `{{\"gap_title\", \"verdict\": \"pass\"|\"fail\", \"reason\", \"evidence_file\"?}}`. \
        Respond with JSON only, nothing else.",
        context.summary
    )
}

fn user_prompt(rule_id: &str, sample: &[&GapSample]) -> String {
    let gaps = sample
        .iter()
        .map(|g| format!("- {} (files: {})", g.gap_title, g.affected_files.join(", ")))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Rule id: {rule_id}\nSample gaps:\n{gaps}")
}

fn try_parse_verdicts(text: &str) -> Option<Vec<GapVerdict>> {
    serde_json::from_str::<Vec<GapVerdict>>(&strip_code_fence(text)).ok()
}

fn try_parse_tool_call(text: &str) -> Option<ToolCall> {
    serde_json::from_str::<ToolCall>(&strip_code_fence(text)).ok()
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

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use llm_budget::BudgetConfig;
    use llm_port::LlmPortError;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct ScriptedLlm(Mutex<Vec<String>>);

    #[async_trait]
    impl LlmPort for ScriptedLlm {
        async fn invoke(&self, _: Profile, _: &str, _: &str) -> Result<LlmCompletion, LlmPortError> {
            let mut script = self.0.lock().unwrap();
            let text = if script.is_empty() { String::new() } else { script.remove(0) };
            Ok(LlmCompletion { text, tokens_used: 10 })
        }
    }

    fn context() -> CodebaseContext {
        CodebaseContext {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            repo_full_name: "acme/billing".to_string(),
            commit_sha: "sha".to_string(),
            created_at: chrono::Utc::now(),
            global_http_metrics: Vec::new(),
            global_db_instrumentation: Vec::new(),
            global_tracing: Vec::new(),
            global_error_handling: Vec::new(),
            logging_framework: None,
            infrastructure_files: Vec::new(),
            summary: "no global instrumentation detected".to_string(),
        }
    }

    fn gaps(n: usize) -> Vec<GapSample> {
        (0..n)
            .map(|i| GapSample { gap_title: format!("gap-{i}"), affected_files: vec!["a.py".to_string()] })
            .collect()
    }

    #[tokio::test]
    async fn high_pass_ratio_marks_group_false_alarm() {
        let llm = ScriptedLlm(Mutex::new(vec![
            r#"[{"gap_title":"gap-0","verdict":"pass","reason":"covered"},{"gap_title":"gap-1","verdict":"pass","reason":"covered"}]"#.to_string(),
        ]));
        let budget = Budget::new(BudgetConfig { max_iterations: 10, max_tokens: 10_000 });
        let outcome = verify_rule_group(&llm, &budget, &context(), &[], "MET_001", &gaps(2)).await;
        assert_eq!(outcome.verdict, VerificationVerdict::FalseAlarm);
    }

    #[tokio::test]
    async fn low_pass_ratio_marks_group_genuine() {
        let llm = ScriptedLlm(Mutex::new(vec![
            r#"[{"gap_title":"gap-0","verdict":"fail","reason":"no coverage"},{"gap_title":"gap-1","verdict":"pass","reason":"covered"}]"#.to_string(),
        ]));
        let budget = Budget::new(BudgetConfig { max_iterations: 10, max_tokens: 10_000 });
        let outcome = verify_rule_group(&llm, &budget, &context(), &[], "MET_001", &gaps(2)).await;
        assert_eq!(outcome.verdict, VerificationVerdict::Genuine);
    }

    #[tokio::test]
    async fn malformed_json_defaults_to_genuine() {
        let llm = ScriptedLlm(Mutex::new(vec!["not json".to_string()]));
        let budget = Budget::new(BudgetConfig { max_iterations: 10, max_tokens: 10_000 });
        let outcome = verify_rule_group(&llm, &budget, &context(), &[], "MET_001", &gaps(2)).await;
        assert_eq!(outcome.verdict, VerificationVerdict::Genuine);
        assert!(outcome.pass_ratio.is_none());
    }

    #[tokio::test]
    async fn step_cap_exhaustion_defaults_to_genuine() {
        let script = vec![r#"{"tool":"list_files","glob_pattern":"*"}"#.to_string(); MAX_AGENT_STEPS as usize];
        let llm = ScriptedLlm(Mutex::new(script));
        let budget = Budget::new(BudgetConfig { max_iterations: 100, max_tokens: 100_000 });
        let outcome = verify_rule_group(&llm, &budget, &context(), &[], "MET_001", &gaps(2)).await;
        assert_eq!(outcome.verdict, VerificationVerdict::Genuine);
    }

    #[tokio::test]
    async fn budget_exhaustion_mid_loop_defaults_to_genuine() {
        let llm = ScriptedLlm(Mutex::new(vec![r#"[]"#.to_string()]));
        let budget = Budget::new(BudgetConfig { max_iterations: 0, max_tokens: 10_000 });
        let outcome = verify_rule_group(&llm, &budget, &context(), &[], "MET_001", &gaps(2)).await;
        assert_eq!(outcome.verdict, VerificationVerdict::Genuine);
    }
}
