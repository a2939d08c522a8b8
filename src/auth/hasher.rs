//! Password hashing and verification (Argon2id, PHC strings).

use std::sync::{Arc, OnceLock};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use tracing::warn;

use crate::config::HasherConfig;
use crate::error::{AppError, AppResult};

/// Longest password accepted for hashing, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 4096;

/// Argon2id hasher with fixed cost parameters.
///
/// Cheap to clone; clones share the lazily built dummy hash used by
/// [`CredentialHasher::verify_dummy`].
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    dummy_hash: Arc<OnceLock<String>>,
}

impl CredentialHasher {
    pub fn new(config: HasherConfig) -> AppResult<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("argon2 params: {}", e)))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            dummy_hash: Arc::new(OnceLock::new()),
        })
    }

    /// Hash with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> AppResult<String> {
        if plaintext.is_empty() {
            return Err(AppError::InvalidInput("password must not be empty".to_string()));
        }
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(AppError::InvalidInput("password is too long".to_string()));
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hash: {}", e)))?
            .to_string();
        Ok(hash)
    }

    /// `false` on mismatch and on a stored hash that does not parse.
    /// Verification uses the parameters embedded in the stored hash.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "malformed stored password hash");
                return false;
            }
        };
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Spend the same work as a real verification, for logins with unknown emails.
    pub fn verify_dummy(&self, plaintext: &str) {
        let dummy = self.dummy_hash.get_or_init(|| {
            let salt = SaltString::generate(&mut OsRng);
            self.argon2
                .hash_password(b"placeholder-credential", &salt)
                .map(|h| h.to_string())
                .unwrap_or_else(|e| {
                    warn!(error = %e, "dummy password hash unavailable");
                    String::new()
                })
        });
        match PasswordHash::new(dummy) {
            Ok(parsed) => {
                let _ = self.argon2.verify_password(plaintext.as_bytes(), &parsed);
            }
            Err(e) => warn!(error = %e, "dummy verification skipped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> CredentialHasher {
        CredentialHasher::new(HasherConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn hash_and_verify_password() {
        let hasher = hasher();
        let hash = hasher.hash("password123").unwrap();
        assert_ne!(hash, "password123");
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("password123", &hash));
        assert!(!hasher.verify("password124", &hash));
        assert!(!hasher.verify("", &hash));
    }

    #[test]
    fn same_password_gets_different_salts() {
        let hasher = hasher();
        let a = hasher.hash("correct-horse-battery-staple").unwrap();
        let b = hasher.hash("correct-horse-battery-staple").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("correct-horse-battery-staple", &a));
        assert!(hasher.verify("correct-horse-battery-staple", &b));
    }

    #[test]
    fn rejects_empty_and_oversized_input() {
        let hasher = hasher();
        assert!(matches!(hasher.hash(""), Err(AppError::InvalidInput(_))));
        let huge = "x".repeat(MAX_PASSWORD_BYTES + 1);
        assert!(matches!(hasher.hash(&huge), Err(AppError::InvalidInput(_))));
        let max = "x".repeat(MAX_PASSWORD_BYTES);
        assert!(hasher.hash(&max).is_ok());
    }

    #[test]
    fn malformed_hash_verifies_false() {
        let hasher = hasher();
        assert!(!hasher.verify("anything", "not-a-valid-hash"));
        assert!(!hasher.verify("anything", ""));
    }

    #[test]
    fn hashes_from_other_cost_settings_still_verify() {
        let hash = hasher().hash("password123").unwrap();
        let stronger = CredentialHasher::new(HasherConfig {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(stronger.verify("password123", &hash));
    }

    #[test]
    fn dummy_verification_builds_a_real_hash_once() {
        let hasher = hasher();
        hasher.verify_dummy("password123");
        let dummy = hasher.dummy_hash.get().cloned().unwrap();
        assert!(dummy.starts_with("$argon2id$"));

        // Clones share the same dummy hash.
        let clone = hasher.clone();
        clone.verify_dummy("other");
        assert_eq!(clone.dummy_hash.get(), Some(&dummy));
    }

    #[test]
    fn invalid_params_are_rejected() {
        let result = CredentialHasher::new(HasherConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(result.is_err());
    }
}
