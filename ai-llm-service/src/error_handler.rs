//! Error types and validation helpers for `ai-llm-service`.
//!
//! This module defines the unified error type returned across the crate's
//! public surface ([`AiLlmError`]), plus a focused set of configuration
//! errors and small, reusable helpers for reading/validating environment
//! variables.
//!
//! All error messages include the suffix `[AI LLM Service]` so that logs
//! and bubbled-up errors can be easily attributed to this library.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias for config and runtime operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level error for every fallible operation this crate exposes.
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/environment error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Provider-specific failure (OpenAI, Ollama, ...).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Health-check failure.
    #[error(transparent)]
    Health(#[from] HealthError),

    /// Raw transport-level failure not yet attributed to a provider.
    #[error("[AI LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Failure surfaced by the low-level Ollama client.
    #[error(transparent)]
    Ollama(#[from] crate::services::ollama_service::OllamaError),
}

/// Which provider an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    OpenAI,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Ollama => write!(f, "Ollama"),
            Provider::OpenAI => write!(f, "OpenAI"),
        }
    }
}

/// Non-2xx HTTP response details, carried for diagnostics.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub url: String,
    pub snippet: String,
}

/// Failure kinds specific to a provider client.
#[derive(Debug, Error)]
pub enum ProviderErrorKind {
    #[error("provider mismatch: config was not built for this client")]
    InvalidProvider,
    #[error("missing API key")]
    MissingApiKey,
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("unexpected HTTP status {status} from {url}: {snippet}", status = .0.status, url = .0.url, snippet = .0.snippet)]
    HttpStatus(HttpError),
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("response contained no choices")]
    EmptyChoices,
}

/// A provider-attributed error.
#[derive(Debug, Error)]
#[error("[AI LLM Service] {provider}: {kind}")]
pub struct ProviderError {
    pub provider: Provider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: Provider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

/// Errors produced while probing provider health.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("unexpected HTTP status {status} from {url}: {snippet}", status = .0.status, url = .0.url, snippet = .0.snippet)]
    HttpStatus(HttpError),
    #[error("failed to decode health response: {0}")]
    Decode(String),
}

/// Error enum for environment/config-driven setup.
///
/// Keep this focused: only errors that realistically happen at config
/// load/validation time. Extend conservatively as needs arise.
///
/// All variants include `[AI LLM Service]` in their messages.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[AI LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like ports, limits, timeouts).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// Unsupported provider in `LLM_KIND`.
    #[error("[AI LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[AI LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: &'static str,
    },

    /// Model name was empty or invalid.
    #[error("[AI LLM Service] model name must not be empty")]
    EmptyModel,

    /// Stop sequences contained one or more empty strings.
    #[error("[AI LLM Service] stop sequences must not contain empty strings")]
    InvalidStopSequence,
}

/* ------------------------ Env helpers ------------------------ */

/// Fetches a required, non-empty environment variable.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.parse::<u32>().map(Some).map_err(|_| {
            ConfigError::InvalidNumber {
                var: name,
                reason: "expected u32",
            }
        }),
        _ => Ok(None),
    }
}

/* --------------------- Validation helpers --------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        })
    }
}

/// Validates that a floating-point value lies within an inclusive range.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        })
    }
}

/// Ensures that a list of stop sequences contains no empty strings.
pub fn validate_stop_sequences<S>(stops: &[S]) -> Result<()>
where
    S: AsRef<str>,
{
    if stops.iter().any(|s| s.as_ref().is_empty()) {
        Err(ConfigError::InvalidStopSequence)
    } else {
        Ok(())
    }
}

/// Truncates a response body to a short diagnostic snippet.
pub fn make_snippet(body: &str) -> String {
    body.chars().take(240).collect()
}
