use std::sync::Arc;

use prompt_guard::PromptGuard;
use review_orchestrator::ReviewOrchestrator;

use crate::core::{
    config::ApiConfig,
    memory_stores::{InMemoryReviewStore, InMemoryServiceStore},
};

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ReviewOrchestrator>,
    pub guard: Arc<PromptGuard>,
    /// Kept alongside the orchestrator (which only sees them as trait
    /// objects) so the trigger route can seed a pending review before
    /// asking the orchestrator to generate it.
    pub services: Arc<InMemoryServiceStore>,
    pub reviews: Arc<InMemoryReviewStore>,
    pub config: ApiConfig,
}
