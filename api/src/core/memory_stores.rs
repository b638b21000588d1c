//! Process-local default adapters for the ports `review-orchestrator` needs.
//!
//! Persistence schema/migration choice and the source-code parser are both
//! out of scope for this workspace (base spec §1), so there is nowhere in
//! the corpus that implements `ReviewStore`/`ServiceStore`/`ScheduleStore`/
//! `CodebaseSyncPort`/`ObservabilityContextResolver`/`CodebaseContextStore`
//! against a real database or a real parser service. These adapters keep
//! state in an in-process `Mutex<HashMap>` so `api::start` produces a
//! runnable binary without inventing a database dependency; a real
//! deployment swaps them for DB-backed and parser-backed implementations
//! behind the same trait (see DESIGN.md).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use domain::{CodebaseContext, ReviewSchedule, Service, ServiceReview};
use observability_collector::ExecutionContext;
use review_orchestrator::{CodebaseSyncPort, CodebaseSyncResult, ObservabilityContextResolver, ReviewError, ReviewStore, ScheduleStore, ServiceStore};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryServiceStore {
    services: Mutex<HashMap<Uuid, Service>>,
}

impl InMemoryServiceStore {
    pub fn new(services: impl IntoIterator<Item = Service>) -> Self {
        let map = services.into_iter().map(|s| (s.id, s)).collect();
        Self { services: Mutex::new(map) }
    }

    pub fn insert(&self, service: Service) {
        self.services.lock().unwrap().insert(service.id, service);
    }
}

#[async_trait]
impl ServiceStore for InMemoryServiceStore {
    async fn load(&self, service_id: Uuid) -> Result<Option<Service>, ReviewError> {
        Ok(self.services.lock().unwrap().get(&service_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryReviewStore {
    reviews: Mutex<HashMap<Uuid, ServiceReview>>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_pending(&self, review: ServiceReview) {
        self.reviews.lock().unwrap().insert(review.id, review);
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn load(&self, review_id: Uuid) -> Result<Option<ServiceReview>, ReviewError> {
        Ok(self.reviews.lock().unwrap().get(&review_id).cloned())
    }

    async fn load_previous_completed(
        &self,
        service_id: Uuid,
        excluding_review_id: Uuid,
    ) -> Result<Option<ServiceReview>, ReviewError> {
        let reviews = self.reviews.lock().unwrap();
        Ok(reviews
            .values()
            .filter(|r| {
                r.service_id == service_id
                    && r.id != excluding_review_id
                    && r.status == domain::ReviewStatus::Completed
            })
            .max_by_key(|r| r.week_end)
            .cloned())
    }

    async fn persist(&self, review: &ServiceReview) -> Result<(), ReviewError> {
        self.reviews.lock().unwrap().insert(review.id, review.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryScheduleStore {
    schedules: Mutex<HashMap<Uuid, ReviewSchedule>>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    async fn load(&self, service_id: Uuid) -> Result<Option<ReviewSchedule>, ReviewError> {
        Ok(self.schedules.lock().unwrap().get(&service_id).cloned())
    }

    async fn save(&self, schedule: &ReviewSchedule) -> Result<(), ReviewError> {
        self.schedules.lock().unwrap().insert(schedule.service_id, schedule.clone());
        Ok(())
    }
}

/// No-op sync: reports an empty, unchanged repository snapshot. Correct
/// default when no parser service is configured — the pipeline still
/// completes, it simply detects zero structural gaps (base spec's "services
/// without a repository still pass through the pipeline").
pub struct NullCodebaseSync;

#[async_trait]
impl CodebaseSyncPort for NullCodebaseSync {
    async fn ensure_synced(&self, workspace_id: Uuid, repo_full_name: &str) -> Result<CodebaseSyncResult, ReviewError> {
        Ok(CodebaseSyncResult {
            parsed_repository: domain::ParsedRepository {
                workspace_id,
                repo_full_name: repo_full_name.to_string(),
                commit_sha: "unknown".to_string(),
                status: domain::RepoStatus::Completed,
                files: Vec::new(),
            },
            changed_files: Vec::new(),
            codebase_changed: false,
        })
    }
}

/// No-op resolver: no provider integration rows are available without a
/// real `credential-cache::IntegrationStore`, so every review runs with an
/// empty `ExecutionContext` (C3 fans out over zero providers).
pub struct NullContextResolver;

#[async_trait]
impl ObservabilityContextResolver for NullContextResolver {
    async fn resolve(&self, _workspace_id: Uuid, _service: &Service) -> ExecutionContext {
        ExecutionContext::new(std::iter::empty())
    }
}

#[derive(Default)]
pub struct InMemoryCodebaseContextStore {
    contexts: Mutex<HashMap<(Uuid, String), CodebaseContext>>,
}

impl InMemoryCodebaseContextStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl codebase_context_store::CodebaseContextStore for InMemoryCodebaseContextStore {
    async fn load_most_recent(
        &self,
        workspace_id: Uuid,
        repo_full_name: &str,
    ) -> Result<Option<CodebaseContext>, codebase_context_store::CodebaseContextStoreError> {
        Ok(self.contexts.lock().unwrap().get(&(workspace_id, repo_full_name.to_string())).cloned())
    }

    async fn save(&self, context: &CodebaseContext) -> Result<(), codebase_context_store::CodebaseContextStoreError> {
        self.contexts
            .lock()
            .unwrap()
            .insert((context.workspace_id, context.repo_full_name.clone()), context.clone());
        Ok(())
    }
}
