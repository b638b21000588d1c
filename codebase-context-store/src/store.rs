//! Persistence seam for `CodebaseContext` rows. The actual table lives in
//! the core's persistence layer, out of scope here (base spec §1/§4.5) —
//! this crate owns only the contract and the invalidation/coverage
//! predicates callers need around it.

use async_trait::async_trait;
use domain::CodebaseContext;
use uuid::Uuid;

use crate::error::CodebaseContextStoreError;

/// Append-only: `save` never mutates an existing row, and `load_most_recent`
/// always returns the newest row for the (workspace, repo) pair, per the
/// domain type's documented invariant.
#[async_trait]
pub trait CodebaseContextStore: Send + Sync {
    async fn load_most_recent(
        &self,
        workspace_id: Uuid,
        repo_full_name: &str,
    ) -> Result<Option<CodebaseContext>, CodebaseContextStoreError>;

    async fn save(&self, context: &CodebaseContext) -> Result<(), CodebaseContextStoreError>;
}
