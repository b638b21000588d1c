//! The LLM provider port: the black-box `invoke` contract every pipeline
//! component calls through (see base spec §6, "LLM provider interface").
//!
//! The wire protocol and provider selection live in `ai-llm-service`; this
//! crate only narrows that surface to the two knobs the pipeline actually
//! needs (a system/user prompt pair and a speed profile) and normalizes the
//! token-usage signal the budget tracker (C1) consumes. `ai-llm-service`'s
//! `generate_fast`/`generate_slow` do not currently surface provider token
//! counts, so `tokens_used` is always the best-effort estimate; the `Some`
//! arm of `TokenUsage` is kept so a future provider upgrade can report real
//! counts without changing this trait's shape.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Which of `ai-llm-service`'s profiles a call should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Cheap/fast model: Phase A/B extraction, the prompt-injection guard.
    Fast,
    /// Higher-quality model: Phase C verification, enrichment.
    Slow,
}

#[derive(Debug, Clone)]
pub struct LlmCompletion {
    pub text: String,
    /// Reported or estimated total tokens spent on this call.
    pub tokens_used: u64,
}

#[derive(Debug, Error)]
pub enum LlmPortError {
    #[error(transparent)]
    Provider(#[from] ai_llm_service::error_handler::AiLlmError),
}

/// The contract every component that talks to an LLM calls through.
///
/// Tool use is not part of this trait: `ai-llm-service`'s underlying
/// providers are plain chat-completion endpoints, so tool-calling is
/// emulated one level up (see `verification-agent`'s prompt-driven agent
/// loop) rather than modeled here as a provider capability.
#[async_trait]
pub trait LlmPort: Send + Sync {
    async fn invoke(
        &self,
        profile: Profile,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<LlmCompletion, LlmPortError>;
}

/// Best-effort token estimate used whenever a provider does not report real
/// usage. ~4 chars/token is the common rule of thumb for English prose and
/// source code; it is deliberately crude (see C1's "best-effort token
/// counting when usage is absent" contract) — it only needs to be in the
/// right order of magnitude to keep the budget meaningful.
pub fn estimate_tokens(system_prompt: &str, user_prompt: &str, completion: &str) -> u64 {
    let chars = system_prompt.len() + user_prompt.len() + completion.len();
    ((chars as u64) / 4).max(1)
}

/// Adapter over `ai-llm-service::LlmServiceProfiles`, the concrete provider
/// this workspace ships with.
pub struct AiLlmServiceAdapter {
    profiles: Arc<ai_llm_service::service_profiles::LlmServiceProfiles>,
}

impl AiLlmServiceAdapter {
    pub fn new(profiles: Arc<ai_llm_service::service_profiles::LlmServiceProfiles>) -> Self {
        Self { profiles }
    }
}

#[async_trait]
impl LlmPort for AiLlmServiceAdapter {
    async fn invoke(
        &self,
        profile: Profile,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<LlmCompletion, LlmPortError> {
        let text = match profile {
            Profile::Fast => {
                self.profiles
                    .generate_fast(user_prompt, Some(system_prompt))
                    .await?
            }
            Profile::Slow => {
                self.profiles
                    .generate_slow(user_prompt, Some(system_prompt))
                    .await?
            }
        };
        let tokens_used = estimate_tokens(system_prompt, user_prompt, &text);
        Ok(LlmCompletion { text, tokens_used })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_estimate_is_never_zero_for_nonempty_input() {
        assert!(estimate_tokens("a", "b", "c") >= 1);
    }

    #[test]
    fn token_estimate_scales_with_length() {
        let short = estimate_tokens("sys", "short user prompt", "ok");
        let long = estimate_tokens("sys", &"word ".repeat(200), "ok");
        assert!(long > short);
    }
}
