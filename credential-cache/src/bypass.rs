//! Scoped removal of `AWS_ENDPOINT_URL` so STS/CloudWatch calls reach real AWS
//! instead of whatever local emulator the rest of the stack points at.
//!
//! Grounded in `original_source/app/aws/Integration/service.py`'s
//! `_bypass_localstack` context manager. Rust has no `finally`, so the same
//! guarantee (restoration on every exit path, including panics) is an RAII
//! guard instead of a context manager.

use std::env;
use std::sync::Mutex;

/// Process-wide guard around env var mutation. `std::env::set_var` is not
/// thread-safe against concurrent reads on every platform; serializing
/// bypass windows avoids two overlapping guards racing each other's restore.
static BYPASS_LOCK: Mutex<()> = Mutex::new(());

const ENDPOINT_VAR: &str = "AWS_ENDPOINT_URL";

/// Holds the bypass window open until dropped. The original value (if any)
/// is restored when this guard goes out of scope, regardless of how the
/// scope exits.
pub struct LocalstackBypassGuard {
    original: Option<String>,
    _permit: std::sync::MutexGuard<'static, ()>,
}

impl LocalstackBypassGuard {
    /// Removes `AWS_ENDPOINT_URL` for the lifetime of the returned guard.
    pub fn acquire() -> Self {
        let permit = BYPASS_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        let original = env::var(ENDPOINT_VAR).ok();
        if original.is_some() {
            unsafe { env::remove_var(ENDPOINT_VAR) };
        }
        Self { original, _permit: permit }
    }
}

impl Drop for LocalstackBypassGuard {
    fn drop(&mut self) {
        if let Some(value) = self.original.take() {
            unsafe { env::set_var(ENDPOINT_VAR, value) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restores_prior_value_on_drop() {
        unsafe { env::set_var(ENDPOINT_VAR, "http://localstack:4566") };
        {
            let _guard = LocalstackBypassGuard::acquire();
            assert!(env::var(ENDPOINT_VAR).is_err());
        }
        assert_eq!(env::var(ENDPOINT_VAR).unwrap(), "http://localstack:4566");
        unsafe { env::remove_var(ENDPOINT_VAR) };
    }

    #[test]
    fn no_op_when_var_was_unset() {
        unsafe { env::remove_var(ENDPOINT_VAR) };
        {
            let _guard = LocalstackBypassGuard::acquire();
            assert!(env::var(ENDPOINT_VAR).is_err());
        }
        assert!(env::var(ENDPOINT_VAR).is_err());
    }
}
