use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant boundary. Cascades to owned integrations, services, and reviews on deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    pub org_domain: Option<String>,
}
