use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodebaseContextStoreError {
    #[error("failed to persist codebase context: {0}")]
    PersistFailed(String),

    #[error("failed to load codebase context: {0}")]
    LoadFailed(String),
}
