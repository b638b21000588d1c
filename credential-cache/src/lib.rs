//! Per-tenant client cache and AWS two-stage STS role assumption (C2).
//!
//! Every component that needs to talk to an observability provider goes
//! through [`ClientCache::get_client`] rather than constructing SDK/HTTP
//! clients itself — this is the only place that knows about role
//! assumption, credential refresh, and the local-emulator bypass.

mod bypass;
mod cache;
mod cipher;
mod client_kind;
mod config;
mod error;
mod store;
mod sts_port;

pub use bypass::LocalstackBypassGuard;
pub use cache::ClientCache;
pub use cipher::{IdentityCipher, SecretCipher};
pub use client_kind::{Client, ClientKind, HttpApiClient};
pub use config::{CredentialCacheConfig, DeploymentMode};
pub use error::CredentialCacheError;
pub use store::IntegrationStore;
pub use sts_port::{AssumeRoleParams, AwsStsPort, StsAssumeRoleAdapter, TemporaryCredentials};
