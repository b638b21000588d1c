//! Global LLM budget tracking for the health review pipeline (C1).
//!
//! One [`Budget`] is created per review and shared (via `Arc`) with every
//! component that makes an LLM call in that review. Before a call starts,
//! [`Budget::check_before_start`] must succeed; after it completes,
//! [`Budget::record_completion`] charges the call's token usage. A call
//! either starts and is fully counted, or is rejected before it starts —
//! there is no partial charge.
//!
//! Grounded in `original_source/app/health_review_system/llm_budget.py`'s
//! `LLMBudgetCallback`: checked-before-start, incremented-after-completion,
//! `on_llm_end`'s `token_usage.total_tokens` (with the generation-info
//! fallback now pushed into `llm-port::estimate_tokens`, since this crate
//! never talks to a provider directly).

use std::sync::Mutex;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy)]
pub struct BudgetConfig {
    pub max_iterations: u64,
    pub max_tokens: u64,
}

impl BudgetConfig {
    /// `HEALTH_REVIEW_LLM_MAX_ITERATIONS` / `HEALTH_REVIEW_LLM_MAX_TOKEN_BUDGET`,
    /// per base spec §6's configuration surface.
    pub fn from_env() -> Self {
        Self {
            max_iterations: crate::env_u64("HEALTH_REVIEW_LLM_MAX_ITERATIONS", 200),
            max_tokens: crate::env_u64("HEALTH_REVIEW_LLM_MAX_TOKEN_BUDGET", 500_000),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    iterations: u64,
    tokens: u64,
}

/// Raised when either the iteration or token cap is already exhausted at
/// the moment a call wants to start. Fatal to the review (§4.1).
#[derive(Debug, Error, Clone)]
#[error("LLM budget exhausted: {reasons}")]
pub struct LlmBudgetExceeded {
    pub iterations_used: u64,
    pub max_iterations: u64,
    pub tokens_used: u64,
    pub max_tokens: u64,
    reasons: String,
}

impl LlmBudgetExceeded {
    fn new(c: Counters, cfg: BudgetConfig) -> Self {
        let mut reasons = Vec::new();
        if c.iterations >= cfg.max_iterations {
            reasons.push(format!("iterations {}/{}", c.iterations, cfg.max_iterations));
        }
        if c.tokens >= cfg.max_tokens {
            reasons.push(format!("tokens {}/{}", c.tokens, cfg.max_tokens));
        }
        Self {
            iterations_used: c.iterations,
            max_iterations: cfg.max_iterations,
            tokens_used: c.tokens,
            max_tokens: cfg.max_tokens,
            reasons: reasons.join(", "),
        }
    }
}

/// One instance owned per review; never shared across reviews (§5).
pub struct Budget {
    config: BudgetConfig,
    counters: Mutex<Counters>,
}

impl Budget {
    pub fn new(config: BudgetConfig) -> Self {
        Self {
            config,
            counters: Mutex::new(Counters::default()),
        }
    }

    fn is_exhausted(c: Counters, cfg: BudgetConfig) -> bool {
        c.iterations >= cfg.max_iterations || c.tokens >= cfg.max_tokens
    }

    /// Must be called before every LLM invocation. Rejects the call before
    /// it starts if the budget is already exhausted.
    pub fn check_before_start(&self) -> Result<(), LlmBudgetExceeded> {
        let c = *self.counters.lock().expect("budget mutex poisoned");
        if Self::is_exhausted(c, self.config) {
            return Err(LlmBudgetExceeded::new(c, self.config));
        }
        Ok(())
    }

    /// Charges one completed call: +1 iteration, + its reported/estimated
    /// token usage. Charged unconditionally — even calls whose output later
    /// fails to parse still spent real provider tokens.
    pub fn record_completion(&self, tokens_used: u64) {
        let mut c = self.counters.lock().expect("budget mutex poisoned");
        c.iterations += 1;
        c.tokens += tokens_used;
        info!(
            iterations = c.iterations,
            max_iterations = self.config.max_iterations,
            tokens = c.tokens,
            max_tokens = self.config.max_tokens,
            "[LLM Budget] call recorded"
        );
    }

    pub fn remaining_iterations(&self) -> u64 {
        let c = *self.counters.lock().expect("budget mutex poisoned");
        self.config.max_iterations.saturating_sub(c.iterations)
    }

    pub fn remaining_tokens(&self) -> u64 {
        let c = *self.counters.lock().expect("budget mutex poisoned");
        self.config.max_tokens.saturating_sub(c.tokens)
    }

    pub fn iterations_used(&self) -> u64 {
        self.counters.lock().expect("budget mutex poisoned").iterations
    }

    pub fn tokens_used(&self) -> u64 {
        self.counters.lock().expect("budget mutex poisoned").tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_budget_is_not_exhausted() {
        let b = Budget::new(BudgetConfig { max_iterations: 5, max_tokens: 100 });
        assert!(b.check_before_start().is_ok());
    }

    #[test]
    fn iteration_cap_is_strict_and_monotonic() {
        let b = Budget::new(BudgetConfig { max_iterations: 2, max_tokens: 1_000_000 });
        b.record_completion(10);
        assert!(b.check_before_start().is_ok());
        b.record_completion(10);
        let err = b.check_before_start().unwrap_err();
        assert_eq!(err.iterations_used, 2);
        assert!(err.to_string().contains("iterations 2/2"));
    }

    #[test]
    fn token_cap_is_strict() {
        let b = Budget::new(BudgetConfig { max_iterations: 1_000, max_tokens: 50 });
        b.record_completion(60);
        let err = b.check_before_start().unwrap_err();
        assert!(err.to_string().contains("tokens 60/50"));
    }

    #[test]
    fn no_partial_charge_on_rejected_call() {
        let b = Budget::new(BudgetConfig { max_iterations: 1, max_tokens: 1_000_000 });
        b.record_completion(5);
        assert!(b.check_before_start().is_err());
        // A caller that respects check_before_start never calls record_completion
        // again, so the counters stay exactly where the one successful call left them.
        assert_eq!(b.iterations_used(), 1);
        assert_eq!(b.tokens_used(), 5);
    }

    #[test]
    fn remaining_counts_saturate_at_zero() {
        let b = Budget::new(BudgetConfig { max_iterations: 1, max_tokens: 10 });
        b.record_completion(100);
        assert_eq!(b.remaining_iterations(), 0);
        assert_eq!(b.remaining_tokens(), 0);
    }
}
