//! The symmetric token processor is external to this workspace (base spec
//! §6: "a pluggable symmetric token processor with a workspace-agnostic
//! key"). This module only defines the seam the cache decrypts/encrypts
//! through, mirroring `original_source`'s `token_processor.encrypt/decrypt`.

use crate::error::CredentialCacheError;

pub trait SecretCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String, CredentialCacheError>;
    fn decrypt(&self, ciphertext: &str) -> Result<String, CredentialCacheError>;
}

/// Reversible but non-cryptographic placeholder for local/demo runs where no
/// real token processor is configured. Never use outside tests or the mock
/// review path — see `HEALTH_REVIEW_DEMO_MODE` in the orchestrator.
pub struct IdentityCipher;

impl SecretCipher for IdentityCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CredentialCacheError> {
        Ok(plaintext.to_string())
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CredentialCacheError> {
        Ok(ciphertext.to_string())
    }
}
