//! Persistence and external-system seams the orchestrator drives through.
//! The actual tables/SDKs live in the core's persistence layer and the
//! external parser service, both out of scope here (base spec §1/§6).

use async_trait::async_trait;
use domain::{ParsedRepository, Service, ServiceReview};
use uuid::Uuid;

use crate::error::ReviewError;

#[async_trait]
pub trait ServiceStore: Send + Sync {
    async fn load(&self, service_id: Uuid) -> Result<Option<Service>, ReviewError>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn load(&self, review_id: Uuid) -> Result<Option<ServiceReview>, ReviewError>;

    /// Most recent `completed` review for the service, excluding the review
    /// currently being generated — used for trend lookup (Phase 1).
    async fn load_previous_completed(
        &self,
        service_id: Uuid,
        excluding_review_id: Uuid,
    ) -> Result<Option<ServiceReview>, ReviewError>;

    /// Writes the full `ServiceReview` tree (row + gaps + SLIs + errors) in
    /// one transactional commit (Phase 8). Also used for the `generating`/
    /// `failed` status transitions, which must themselves be durable before
    /// the next phase runs (base spec §4.8).
    async fn persist(&self, review: &ServiceReview) -> Result<(), ReviewError>;
}

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn load(&self, service_id: Uuid) -> Result<Option<domain::ReviewSchedule>, ReviewError>;
    async fn save(&self, schedule: &domain::ReviewSchedule) -> Result<(), ReviewError>;
}

/// Outcome of a sync, telling the orchestrator both the fresh snapshot and
/// what changed since the last one it saw (needed for C5/C6's fast-path
/// invalidation check and for `ServiceReview.codebase_changed`).
#[derive(Debug, Clone)]
pub struct CodebaseSyncResult {
    pub parsed_repository: ParsedRepository,
    pub changed_files: Vec<String>,
    pub codebase_changed: bool,
}

/// Ensures the locally-parsed repository snapshot reflects the latest
/// parsed commit before Phase 3 reads it. Parsing itself is external and
/// out of scope; this seam only models the contract the orchestrator
/// depends on (`original_source`'s `CodebaseSyncService` import, SPEC
/// addition — see DESIGN.md).
#[async_trait]
pub trait CodebaseSyncPort: Send + Sync {
    async fn ensure_synced(
        &self,
        workspace_id: Uuid,
        repo_full_name: &str,
    ) -> Result<CodebaseSyncResult, ReviewError>;
}

/// Resolves which observability providers are configured and healthy for a
/// workspace/service, feeding `observability_collector::Collector::collect`.
/// Kept separate from `credential-cache` so this crate never needs to know
/// about role assumption or client construction directly.
#[async_trait]
pub trait ObservabilityContextResolver: Send + Sync {
    async fn resolve(&self, workspace_id: Uuid, service: &Service) -> observability_collector::ExecutionContext;
}
