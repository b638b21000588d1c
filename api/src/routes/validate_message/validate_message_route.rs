use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::Response,
};
use tracing::instrument;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    routes::validate_message::{
        validate_message_request::ValidateMessageRequest, validate_message_response::ValidateMessageResponse,
    },
};

/// Runs a user-originated message through the prompt injection guard (C9).
///
/// Blocked messages come back as a 400 with a stable `UNSAFE_USER_INPUT`
/// code (base spec §7), never a 5xx — a rejected message is an expected
/// outcome of this endpoint, not a server failure.
#[instrument(name = "validate_message_route", skip(state, body))]
pub async fn validate_message_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ValidateMessageRequest>,
) -> Response {
    let decision = state.guard.validate(&body.message, body.context.as_deref(), body.workspace_id).await;

    if !decision.is_safe {
        let envelope: ApiResponse<()> = ApiResponse::error("UNSAFE_USER_INPUT", decision.reason, Vec::new());
        return envelope.into_response_with_status(StatusCode::BAD_REQUEST);
    }

    ApiResponse::success(ValidateMessageResponse { is_safe: true, reason: decision.reason })
        .into_response_with_status(StatusCode::OK)
}
