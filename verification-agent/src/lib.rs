//! Verification Agent (C6): decides which rule-engine gaps are genuine,
//! false_alarm, or covered_globally, via a fast path (context reuse,
//! base spec §4.6.1) or a three-phase LLM slow path (§4.6.2).

mod error;
mod extraction;
mod phase_a;
mod phase_b;
mod phase_c;
mod tools;
mod tree;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use codebase_context_store::CodebaseContextStore;
use domain::{CodebaseContext, DetectedProblem, ParsedFile, ProblemType, VerificationVerdict};
use llm_budget::Budget;
use llm_port::LlmPort;
use rule_engine::RuleEngineResult;
use uuid::Uuid;

pub use error::VerificationError;
pub use phase_c::{VERIFICATION_CONFIDENCE_THRESHOLD, VERIFICATION_SAMPLE_SIZE};

#[derive(Debug, Clone)]
pub struct VerifiedGap {
    pub problem: DetectedProblem,
    pub verdict: Option<VerificationVerdict>,
}

#[derive(Debug, Clone, Default)]
pub struct VerificationOutcome {
    pub logging_gaps: Vec<VerifiedGap>,
    pub metrics_gaps: Vec<VerifiedGap>,
    pub new_context: Option<CodebaseContext>,
    pub used_fast_path: bool,
}

impl VerificationOutcome {
    pub fn all_gaps(&self) -> impl Iterator<Item = &VerifiedGap> {
        self.logging_gaps.iter().chain(self.metrics_gaps.iter())
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn verify(
    llm: Arc<dyn LlmPort>,
    budget: Arc<Budget>,
    context_store: &dyn CodebaseContextStore,
    workspace_id: Uuid,
    repo_full_name: &str,
    commit_sha: &str,
    changed_files: &[String],
    files: &[ParsedFile],
    rule_result: RuleEngineResult,
) -> Result<VerificationOutcome, VerificationError> {
    let current = context_store.load_most_recent(workspace_id, repo_full_name).await?;

    if let Some(context) = &current {
        if codebase_context_store::is_reusable(context, changed_files) {
            tracing::info!(repo_full_name, "Phase C skipped: reusing current codebase context");
            return Ok(fast_path(rule_result, context));
        }
    }

    slow_path(llm, budget, context_store, workspace_id, repo_full_name, commit_sha, files, rule_result).await
}

fn fast_path(rule_result: RuleEngineResult, context: &CodebaseContext) -> VerificationOutcome {
    let suppressed: HashSet<&str> = codebase_context_store::suppressed_rule_ids(context).into_iter().collect();
    let filtered = rule_engine::suppress_rules(rule_result, &suppressed);

    VerificationOutcome {
        logging_gaps: filtered.logging_gaps.into_iter().map(|problem| VerifiedGap { problem, verdict: None }).collect(),
        metrics_gaps: filtered.metrics_gaps.into_iter().map(|problem| VerifiedGap { problem, verdict: None }).collect(),
        new_context: None,
        used_fast_path: true,
    }
}

#[allow(clippy::too_many_arguments)]
async fn slow_path(
    llm: Arc<dyn LlmPort>,
    budget: Arc<Budget>,
    context_store: &dyn CodebaseContextStore,
    workspace_id: Uuid,
    repo_full_name: &str,
    commit_sha: &str,
    files: &[ParsedFile],
    rule_result: RuleEngineResult,
) -> Result<VerificationOutcome, VerificationError> {
    let entries = tree::entries(files);
    let rule_ids: Vec<String> = rule_result
        .all_gaps()
        .map(|p| p.rule_id.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let candidates = phase_a::identify_candidates(llm.as_ref(), budget.as_ref(), &entries, &rule_ids).await?;

    if candidates.is_empty() {
        tracing::warn!(repo_full_name, "Phase A found no candidates; writing empty context, all gaps remain genuine");
        let empty_context = extraction::build_context(
            workspace_id,
            repo_full_name.to_string(),
            commit_sha.to_string(),
            &[],
        );
        context_store.save(&empty_context).await?;
        return Ok(all_genuine(rule_result, empty_context));
    }

    let extractions = phase_b::extract_all(Arc::clone(&llm), Arc::clone(&budget), files, &candidates).await;
    let new_context =
        extraction::build_context(workspace_id, repo_full_name.to_string(), commit_sha.to_string(), &extractions);
    context_store.save(&new_context).await?;

    let verdicts = phase_c_all_groups(llm.as_ref(), budget.as_ref(), &new_context, files, &rule_result).await;

    let logging_gaps = apply_verdicts(rule_result.logging_gaps, &verdicts);
    let metrics_gaps = apply_verdicts(rule_result.metrics_gaps, &verdicts);

    Ok(VerificationOutcome { logging_gaps, metrics_gaps, new_context: Some(new_context), used_fast_path: false })
}

async fn phase_c_all_groups(
    llm: &dyn LlmPort,
    budget: &Budget,
    context: &CodebaseContext,
    files: &[ParsedFile],
    rule_result: &RuleEngineResult,
) -> HashMap<String, VerificationVerdict> {
    let mut by_rule: HashMap<&str, Vec<phase_c::GapSample>> = HashMap::new();
    for problem in rule_result.all_gaps() {
        by_rule.entry(problem.rule_id.as_str()).or_default().push(phase_c::GapSample {
            gap_title: problem.title.clone(),
            affected_files: problem.affected_files.clone(),
        });
    }

    let delay_seconds = verification_delay_seconds();
    let mut verdicts = HashMap::new();
    let mut groups = by_rule.into_iter().peekable();
    while let Some((rule_id, samples)) = groups.next() {
        let outcome = phase_c::verify_rule_group(llm, budget, context, files, rule_id, &samples).await;
        verdicts.insert(rule_id.to_string(), outcome.verdict);

        if delay_seconds > 0 && groups.peek().is_some() {
            tokio::time::sleep(std::time::Duration::from_secs(delay_seconds)).await;
        }
    }
    verdicts
}

/// `HEALTH_REVIEW_VERIFICATION_DELAY_SECONDS` — inter-group rate-limit
/// sleep between Phase C rule groups (base spec §5), default 0.
fn verification_delay_seconds() -> u64 {
    std::env::var("HEALTH_REVIEW_VERIFICATION_DELAY_SECONDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn apply_verdicts(problems: Vec<DetectedProblem>, verdicts: &HashMap<String, VerificationVerdict>) -> Vec<VerifiedGap> {
    problems
        .into_iter()
        .map(|problem| {
            let verdict = verdicts.get(&problem.rule_id).copied();
            VerifiedGap { problem, verdict }
        })
        .collect()
}

fn all_genuine(rule_result: RuleEngineResult, context: CodebaseContext) -> VerificationOutcome {
    let mark = |problems: Vec<DetectedProblem>| {
        problems
            .into_iter()
            .map(|problem| VerifiedGap { problem, verdict: Some(VerificationVerdict::Genuine) })
            .collect()
    };
    VerificationOutcome {
        logging_gaps: mark(rule_result.logging_gaps),
        metrics_gaps: mark(rule_result.metrics_gaps),
        new_context: Some(context),
        used_fast_path: false,
    }
}

pub fn problem_type_of(rule_id: &str) -> ProblemType {
    rule_engine::problem_type_of(rule_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codebase_context_store::CodebaseContextStoreError;
    use domain::{GlobalInstrumentation, Severity};
    use llm_budget::BudgetConfig;
    use llm_port::{LlmCompletion, LlmPortError};
    use std::sync::Mutex;
    use tokio::sync::Mutex as AsyncMutex;

    struct FakeStore(AsyncMutex<Option<CodebaseContext>>);

    #[async_trait]
    impl CodebaseContextStore for FakeStore {
        async fn load_most_recent(&self, _: Uuid, _: &str) -> Result<Option<CodebaseContext>, CodebaseContextStoreError> {
            Ok(self.0.lock().await.clone())
        }

        async fn save(&self, context: &CodebaseContext) -> Result<(), CodebaseContextStoreError> {
            *self.0.lock().await = Some(context.clone());
            Ok(())
        }
    }

    struct FakeLlm(Mutex<Vec<String>>);

    #[async_trait]
    impl LlmPort for FakeLlm {
        async fn invoke(&self, _: llm_port::Profile, _: &str, _: &str) -> Result<LlmCompletion, LlmPortError> {
            let mut script = self.0.lock().unwrap();
            let text = if script.is_empty() { "[]".to_string() } else { script.remove(0) };
            Ok(LlmCompletion { text, tokens_used: 5 })
        }
    }

    fn problem(rule_id: &str, problem_type: ProblemType) -> DetectedProblem {
        DetectedProblem {
            rule_id: rule_id.to_string(),
            problem_type,
            severity: Severity::High,
            title: format!("{rule_id} gap"),
            category: "observability".to_string(),
            affected_files: vec!["a.py".to_string()],
            affected_functions: vec!["handler".to_string()],
            evidence: Vec::new(),
            metric_type: None,
            suggested_metric_names: Vec::new(),
        }
    }

    #[tokio::test]
    async fn fast_path_suppresses_covered_rules_without_verdicts() {
        let context = CodebaseContext {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            repo_full_name: "acme/billing".to_string(),
            commit_sha: "sha".to_string(),
            created_at: chrono::Utc::now(),
            global_http_metrics: vec![GlobalInstrumentation {
                file_path: "middleware.py".to_string(),
                instrumentation_type: "http_metrics".to_string(),
                metrics_recorded: vec![],
                coverage: "all_routes".to_string(),
                registration_file: None,
                description: "global".to_string(),
            }],
            global_db_instrumentation: Vec::new(),
            global_tracing: Vec::new(),
            global_error_handling: Vec::new(),
            logging_framework: None,
            infrastructure_files: vec!["middleware.py".to_string()],
            summary: "".to_string(),
        };
        let store = FakeStore(AsyncMutex::new(Some(context)));
        let rule_result = RuleEngineResult {
            logging_gaps: vec![problem("LOG_001", ProblemType::LoggingGap)],
            metrics_gaps: vec![problem("MET_001", ProblemType::MetricsGap)],
            facts_summary: Default::default(),
        };
        let llm: Arc<dyn LlmPort> = Arc::new(FakeLlm(Mutex::new(vec![])));
        let budget = Arc::new(Budget::new(BudgetConfig { max_iterations: 10, max_tokens: 10_000 }));

        let outcome = verify(
            llm,
            budget,
            &store,
            Uuid::new_v4(),
            "acme/billing",
            "sha",
            &["unrelated.py".to_string()],
            &[],
            rule_result,
        )
        .await
        .unwrap();

        assert!(outcome.used_fast_path);
        assert_eq!(outcome.logging_gaps.len(), 1);
        assert!(outcome.metrics_gaps.is_empty());
        assert!(outcome.logging_gaps[0].verdict.is_none());
    }

    #[tokio::test]
    async fn no_prior_context_and_no_candidates_marks_all_genuine() {
        let store = FakeStore(AsyncMutex::new(None));
        let rule_result = RuleEngineResult {
            logging_gaps: vec![problem("LOG_001", ProblemType::LoggingGap)],
            metrics_gaps: Vec::new(),
            facts_summary: Default::default(),
        };
        let llm: Arc<dyn LlmPort> = Arc::new(FakeLlm(Mutex::new(vec!["not json".to_string()])));
        let budget = Arc::new(Budget::new(BudgetConfig { max_iterations: 10, max_tokens: 10_000 }));

        let outcome = verify(
            llm,
            budget,
            &store,
            Uuid::new_v4(),
            "acme/billing",
            "sha",
            &[],
            &[],
            rule_result,
        )
        .await
        .unwrap();

        assert!(!outcome.used_fast_path);
        assert_eq!(outcome.logging_gaps[0].verdict, Some(VerificationVerdict::Genuine));
        assert!(outcome.new_context.is_some());
    }
}
