use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use review_orchestrator::ReviewError;
use serde::Serialize;
use thiserror::Error;

use crate::core::config::ConfigError;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("llm configuration error: {0}")]
    Llm(String),

    #[error("not found")]
    NotFound,

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // 4xx
            AppError::MissingEnv(_) => StatusCode::INTERNAL_SERVER_ERROR, // startup-only
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,     // startup-only
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Llm(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,

            // custom mapped
            AppError::Http { status, .. } => *status,

            // 5xx
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingEnv(_) => "MISSING_ENV",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Llm(_) => "LLM_CONFIG_ERROR",
            AppError::NotFound => "NOT_FOUND",
            AppError::Http { code, .. } => code,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Optional: convert common Axum rejections to `AppError`.
impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<axum::extract::rejection::QueryRejection> for AppError {
    fn from(err: axum::extract::rejection::QueryRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Maps a `ReviewError` to `AppError::Http` with the status/code base spec
/// §7 names: fatal pipeline conditions become 5xx/422, never a bare 500.
impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        let code = match &err {
            ReviewError::ReviewNotFound(_) => "REVIEW_NOT_FOUND",
            ReviewError::ServiceNotFound(_) => "SERVICE_NOT_FOUND",
            ReviewError::NoParsedRepository => "NO_PARSED_REPOSITORY",
            ReviewError::Cancelled => "REVIEW_CANCELLED",
            ReviewError::LlmBudgetExceeded(_) => "LLM_BUDGET_EXCEEDED",
            ReviewError::LlmPort(_) => "LLM_PROVIDER_ERROR",
            ReviewError::Verification(_) => "VERIFICATION_ERROR",
            ReviewError::ContextStore(_) => "CONTEXT_STORE_ERROR",
            ReviewError::CodebaseSync(_) => "CODEBASE_SYNC_ERROR",
            ReviewError::Persist(_) => "PERSIST_ERROR",
        };
        let status = match &err {
            ReviewError::ReviewNotFound(_) | ReviewError::ServiceNotFound(_) => StatusCode::NOT_FOUND,
            ReviewError::NoParsedRepository | ReviewError::Cancelled | ReviewError::LlmBudgetExceeded(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ReviewError::LlmPort(_) | ReviewError::CodebaseSync(_) => StatusCode::BAD_GATEWAY,
            ReviewError::Verification(_) | ReviewError::ContextStore(_) | ReviewError::Persist(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        AppError::Http { status, code, message: err.to_string() }
    }
}
