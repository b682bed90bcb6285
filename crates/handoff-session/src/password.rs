//! Salted credential hashing.

use argon2::password_hash::SaltString;
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier,
    Version,
};
use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::SessionError;

/// Hashes and verifies user secrets with Argon2id.
///
/// Hashes are stored as PHC strings, which embed the salt and the cost
/// parameters. Verification always uses the parameters recorded in the
/// hash, so changing the cost only affects newly registered users.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    /// Uses custom Argon2id cost parameters.
    ///
    /// Mainly for tests, where the default memory cost makes every
    /// registration noticeably slow in debug builds.
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hashes `secret` under a fresh random salt.
    ///
    /// # Errors
    /// - [`SessionError::RandomnessUnavailable`] if the OS random source
    ///   fails while drawing the salt
    /// - [`SessionError::Hashing`] if Argon2 rejects the input
    pub fn hash(&self, secret: &str) -> Result<String, SessionError> {
        let salt = salt()?;
        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| SessionError::Hashing(e.to_string()))
    }

    /// Returns `true` if `secret` matches the stored PHC string.
    ///
    /// A malformed stored hash never verifies.
    pub fn verify(&self, secret: &str, stored: &str) -> bool {
        PasswordHash::new(stored)
            .ok()
            .as_ref()
            .map(|hash| {
                self.argon2
                    .verify_password(secret.as_bytes(), hash)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

/// Draws a 16-byte salt straight from the OS so a failing entropy source
/// surfaces as an error instead of a panic.
fn salt() -> Result<SaltString, SessionError> {
    let mut bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| SessionError::RandomnessUnavailable(e.to_string()))?;
    SaltString::encode_b64(&bytes).map_err(|e| SessionError::Hashing(e.to_string()))
}
