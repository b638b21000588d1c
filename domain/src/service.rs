use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reviewable unit owned by a workspace.
///
/// `repository` must be set for a review to produce non-trivial gap output;
/// services without one still pass through the pipeline and simply never
/// accumulate structural gaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub repository: Option<RepositoryReference>,
    pub metrics_provider_tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryReference {
    pub owner: String,
    pub name: String,
}

impl RepositoryReference {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}
