//! Codebase Context Store (C5): append-only persistence for per-(workspace,
//! repo) `CodebaseContext` rows, plus the fast-path reuse/suppression
//! predicates built on top of it.
//!
//! Grounded in base spec §4.5 ("unchanged contract"): `load_most_recent`
//! returns the newest row or `None`; `save` appends and never mutates.

mod decision;
mod error;
mod store;

pub use decision::{is_reusable, suppressed_rule_ids};
pub use error::CodebaseContextStoreError;
pub use store::CodebaseContextStore;

#[cfg(test)]
pub mod fake {
    //! In-memory `CodebaseContextStore` for callers' unit tests.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use domain::CodebaseContext;
    use uuid::Uuid;

    use super::*;

    #[derive(Default)]
    pub struct InMemoryContextStore {
        rows: Mutex<HashMap<(Uuid, String), Vec<CodebaseContext>>>,
    }

    #[async_trait]
    impl CodebaseContextStore for InMemoryContextStore {
        async fn load_most_recent(
            &self,
            workspace_id: Uuid,
            repo_full_name: &str,
        ) -> Result<Option<CodebaseContext>, CodebaseContextStoreError> {
            let rows = self.rows.lock().unwrap_or_else(|p| p.into_inner());
            Ok(rows
                .get(&(workspace_id, repo_full_name.to_string()))
                .and_then(|history| history.iter().max_by_key(|c| c.created_at).cloned()))
        }

        async fn save(&self, context: &CodebaseContext) -> Result<(), CodebaseContextStoreError> {
            let mut rows = self.rows.lock().unwrap_or_else(|p| p.into_inner());
            rows.entry((context.workspace_id, context.repo_full_name.clone()))
                .or_default()
                .push(context.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn save_then_load_most_recent_roundtrips() {
        use chrono::{Duration, Utc};

        let store = InMemoryContextStore::default();
        let workspace_id = Uuid::new_v4();
        let older = CodebaseContext {
            id: Uuid::new_v4(),
            workspace_id,
            repo_full_name: "acme/billing".to_string(),
            commit_sha: "aaa".to_string(),
            created_at: Utc::now() - Duration::hours(1),
            global_http_metrics: Vec::new(),
            global_db_instrumentation: Vec::new(),
            global_tracing: Vec::new(),
            global_error_handling: Vec::new(),
            logging_framework: None,
            infrastructure_files: Vec::new(),
            summary: "older".to_string(),
        };
        let mut newer = older.clone();
        newer.id = Uuid::new_v4();
        newer.commit_sha = "bbb".to_string();
        newer.created_at = Utc::now();
        newer.summary = "newer".to_string();

        store.save(&older).await.unwrap();
        store.save(&newer).await.unwrap();

        let loaded = store
            .load_most_recent(workspace_id, "acme/billing")
            .await
            .unwrap()
            .expect("row present");
        assert_eq!(loaded.summary, "newer");
    }

    #[tokio::test]
    async fn load_most_recent_returns_none_for_unknown_repo() {
        let store = InMemoryContextStore::default();
        let loaded = store
            .load_most_recent(Uuid::new_v4(), "acme/unknown")
            .await
            .unwrap();
        assert!(loaded.is_none());
    }
}
