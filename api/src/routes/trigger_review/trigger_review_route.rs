use std::sync::Arc;

use axum::extract::{Json, State};
use domain::{RepositoryReference, Service, ServiceReview, ReviewStatus};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::{
    core::{app_state::AppState, http::response_envelope::{ApiErrorDetail, ApiResponse}},
    error_handler::AppError,
    routes::trigger_review::{trigger_review_request::TriggerReviewRequest, trigger_review_response::TriggerReviewResponse},
};

/// HTTP endpoint for triggering one service's health review.
///
/// Expects `review_id`, `service_id`, `workspace_id` and a shared `secret`.
/// If the secret matches the configured `trigger_secret`, seeds the
/// process-local stores with the service and a pending review row, then
/// runs the full pipeline synchronously.
#[instrument(name = "trigger_review_route", skip(state, body), fields(review_id = %body.review_id))]
pub async fn trigger_review_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TriggerReviewRequest>,
) -> axum::response::Response {
    use axum::response::IntoResponse;

    let expected_secret = state.config.trigger_secret.trim();
    let provided_secret = body.secret.trim();

    if provided_secret.is_empty() || provided_secret != expected_secret {
        let details = vec![ApiErrorDetail {
            path: Some("secret".into()),
            hint: Some("Secret does not match the configured trigger secret.".into()),
        }];
        return ApiResponse::<()>::error("UNAUTHORIZED", "Invalid trigger secret.", details)
            .into_response_with_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    seed_stores(&state, &body);

    info!(service_id = %body.service_id, workspace_id = %body.workspace_id, "starting review generation trigger");

    let request = review_orchestrator::ReviewGenerationRequest {
        review_id: body.review_id,
        service_id: body.service_id,
        workspace_id: body.workspace_id,
        week_start: body.week_start,
        week_end: body.week_end,
    };

    match run_trigger(&state, request).await {
        Ok(result) => ApiResponse::success(TriggerReviewResponse {
            review_id: result.review_id,
            success: result.success,
            generation_duration_seconds: result.generation_duration_seconds,
            error_message: result.error_message,
        })
        .into_response_with_status(axum::http::StatusCode::OK),
        Err(err) => AppError::from(err).into_response(),
    }
}

async fn run_trigger(
    state: &AppState,
    request: review_orchestrator::ReviewGenerationRequest,
) -> Result<review_orchestrator::ReviewGenerationResult, review_orchestrator::ReviewError> {
    state.orchestrator.generate(request, CancellationToken::new()).await
}

fn seed_stores(state: &AppState, body: &TriggerReviewRequest) {
    let repository = match (&body.repo_owner, &body.repo_name) {
        (Some(owner), Some(name)) => Some(RepositoryReference { owner: owner.clone(), name: name.clone() }),
        _ => None,
    };

    state.services.insert(Service {
        id: body.service_id,
        workspace_id: body.workspace_id,
        name: body.service_name.clone(),
        repository,
        metrics_provider_tag: None,
    });

    state.reviews.insert_pending(pending_review(&body));
}

fn pending_review(body: &TriggerReviewRequest) -> ServiceReview {
    ServiceReview {
        id: body.review_id,
        service_id: body.service_id,
        workspace_id: body.workspace_id,
        week_start: body.week_start,
        week_end: body.week_end,
        analyzed_commit_sha: None,
        codebase_changed: false,
        status: ReviewStatus::Pending,
        overall_health_score: None,
        summary: None,
        recommendations: None,
        generation_duration_seconds: None,
        error_count_analyzed: 0,
        log_volume_analyzed: 0,
        metric_count_analyzed: 0,
        error_message: None,
        logging_gaps: Vec::new(),
        metrics_gaps: Vec::new(),
        slis: Vec::new(),
        errors: Vec::new(),
    }
}
