//! Persistence seam for integration records. The cache reads the current
//! row before deciding whether to refresh, and writes the row back after a
//! successful re-assumption — the actual table lives in the core's
//! persistence layer, out of scope here (base spec §6).

use async_trait::async_trait;
use domain::{AwsIntegration, ThirdPartyIntegration, ThirdPartyProvider};
use uuid::Uuid;

use crate::error::CredentialCacheError;

#[async_trait]
pub trait IntegrationStore: Send + Sync {
    async fn load_aws(&self, workspace_id: Uuid) -> Result<Option<AwsIntegration>, CredentialCacheError>;
    async fn save_aws(&self, integration: &AwsIntegration) -> Result<(), CredentialCacheError>;

    async fn load_third_party(
        &self,
        workspace_id: Uuid,
        provider: ThirdPartyProvider,
    ) -> Result<Option<ThirdPartyIntegration>, CredentialCacheError>;
}
