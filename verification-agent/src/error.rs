use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error(transparent)]
    BudgetExceeded(#[from] llm_budget::LlmBudgetExceeded),

    #[error(transparent)]
    LlmPort(#[from] llm_port::LlmPortError),

    #[error("failed to persist codebase context: {0}")]
    ContextStore(#[from] codebase_context_store::CodebaseContextStoreError),
}
