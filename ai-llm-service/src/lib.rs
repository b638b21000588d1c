//! Shared LLM service layer: providers (Ollama/OpenAI), unified errors,
//! health checks, and fast/slow/embedding profiles.
//!
//! Consumers construct a single [`service_profiles::LlmServiceProfiles`],
//! wrap it in an `Arc`, and share it across the application.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

/// Convenience re-exports matching the crate's most commonly used types.
pub mod llm {
    pub use crate::config::llm_model_config::LlmModelConfig;
    pub use crate::config::llm_provider::LlmProvider;
}
