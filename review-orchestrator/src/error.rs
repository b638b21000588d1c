use uuid::Uuid;

use thiserror::Error;

/// Aggregates every component-level error the pipeline can raise, mirroring
/// `mr-reviewer::errors::Error`'s nested-enum shape. Any variant reaching
/// `ReviewOrchestrator::generate` is caught, recorded as the review's
/// `error_message`, and turned into a `failed` transition rather than
/// propagated — see `lib.rs`.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("review {0} not found")]
    ReviewNotFound(Uuid),

    #[error("service {0} not found")]
    ServiceNotFound(Uuid),

    #[error("no_parsed_repository: no parsed repository available for this service")]
    NoParsedRepository,

    #[error("review generation cancelled")]
    Cancelled,

    #[error(transparent)]
    LlmBudgetExceeded(#[from] llm_budget::LlmBudgetExceeded),

    #[error(transparent)]
    LlmPort(#[from] llm_port::LlmPortError),

    #[error(transparent)]
    Verification(#[from] verification_agent::VerificationError),

    #[error(transparent)]
    ContextStore(#[from] codebase_context_store::CodebaseContextStoreError),

    #[error("failed to sync codebase: {0}")]
    CodebaseSync(String),

    #[error("failed to persist review: {0}")]
    Persist(String),
}
