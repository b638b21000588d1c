//! HTTP entrypoint: wires the health review pipeline (C1-C9) behind a
//! small axum router and serves it.
//!
//! Per base spec §1, the HTTP API surface and its request validation
//! (beyond the review-trigger surface) are out of scope; this crate exposes
//! exactly two routes: one to trigger a review generation, one to run a
//! message through the prompt injection guard.

pub mod core;
pub mod error_handler;
pub mod middleware_layer;
pub mod routes;

use std::sync::Arc;

use axum::{Router, middleware, routing::post};
use llm_port::{AiLlmServiceAdapter, LlmPort};
use observability_collector::{Collector, ProviderSet};
use review_orchestrator::{OrchestratorConfig, ReviewOrchestrator};
use tracing::info;

use crate::{
    core::{
        app_state::AppState,
        config::ApiConfig,
        memory_stores::{
            InMemoryCodebaseContextStore, InMemoryReviewStore, InMemoryScheduleStore, InMemoryServiceStore,
            NullCodebaseSync, NullContextResolver,
        },
    },
    error_handler::AppError,
    middleware_layer::json_extractor::json_error_mapper,
    routes::{trigger_review::trigger_review_route, validate_message::validate_message_route},
};

pub async fn start() -> Result<(), AppError> {
    let config = ApiConfig::from_env()?;

    let llm = build_llm_adapter()?;
    let collector = Arc::new(Collector::new(ProviderSet::default()));
    let services = Arc::new(InMemoryServiceStore::default());
    let reviews = Arc::new(InMemoryReviewStore::new());
    let schedules = Arc::new(InMemoryScheduleStore::new());

    let orchestrator = Arc::new(ReviewOrchestrator::new(
        Arc::clone(&llm),
        collector,
        Arc::new(NullContextResolver),
        Arc::clone(&services) as Arc<dyn review_orchestrator::ServiceStore>,
        Arc::clone(&reviews) as Arc<dyn review_orchestrator::ReviewStore>,
        schedules,
        Arc::new(NullCodebaseSync),
        Arc::new(InMemoryCodebaseContextStore::new()),
        OrchestratorConfig::from_env(),
    ));

    let guard = Arc::new(prompt_guard::PromptGuard::new(llm, Arc::new(SecurityEventLogger)));

    let state = Arc::new(AppState { orchestrator, guard, services, reviews, config: config.clone() });

    let app = Router::new()
        .route("/reviews/trigger", post(trigger_review_route))
        .route("/guard/validate", post(validate_message_route))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await.map_err(AppError::Bind)?;
    info!(bind_addr = %config.bind_addr, "api listening");

    axum::serve(listener, app).await.map_err(AppError::Server)?;

    Ok(())
}

fn build_llm_adapter() -> Result<Arc<dyn LlmPort>, AppError> {
    let fast = ai_llm_service::config::default_config::config_ollama_fast()
        .map_err(|e| AppError::Llm(format!("config: {e}")))?;
    let slow = ai_llm_service::config::default_config::config_ollama_slow()
        .map_err(|e| AppError::Llm(format!("config: {e}")))?;
    let embedding = ai_llm_service::config::default_config::config_ollama_embedding()
        .map_err(|e| AppError::Llm(format!("config: {e}")))?;

    let profiles = ai_llm_service::service_profiles::LlmServiceProfiles::new(fast, Some(slow), embedding, None)
        .map_err(|e| AppError::Llm(format!("service: {e}")))?;

    Ok(Arc::new(AiLlmServiceAdapter::new(Arc::new(profiles))) as Arc<dyn LlmPort>)
}

/// Minimal `SecurityEventSink` that logs every guard event through
/// `tracing` rather than a database table (see `core::memory_stores`'s
/// module doc for why persistence is stubbed process-locally here).
struct SecurityEventLogger;

#[async_trait::async_trait]
impl prompt_guard::SecurityEventSink for SecurityEventLogger {
    async fn record(&self, event: domain::SecurityEvent) {
        tracing::warn!(
            event_type = ?event.event_type,
            severity = ?event.severity,
            reason = %event.reason,
            "security event recorded"
        );
    }
}
