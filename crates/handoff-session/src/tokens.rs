//! Single-use login tokens.
//!
//! A successful login issues a token bound to the user. Presenting the
//! token on connect consumes it: the lookup and the removal happen under
//! one lock acquisition, so two connect attempts racing on the same token
//! can never both succeed.
//!
//! Tokens do not expire. They live until consumed or revoked.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::{Authenticator, SessionError, User};

/// Bytes of OS entropy per token. Tokens are hex-encoded, so a token is
/// twice this many characters long.
pub const TOKEN_BYTES: usize = 24;

/// Maps live tokens to the user they were issued for.
#[derive(Default)]
pub struct TokenStore {
    tokens: Mutex<HashMap<String, Arc<User>>>,
}

impl TokenStore {
    /// Creates an empty token store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new token bound to `user`.
    ///
    /// The token never collides with one that is still live.
    ///
    /// # Errors
    /// [`SessionError::RandomnessUnavailable`] if the OS random source
    /// fails. Nothing is stored in that case.
    pub fn issue(&self, user: Arc<User>) -> Result<String, SessionError> {
        let token = loop {
            // Entropy is drawn outside the lock.
            let candidate = generate_token()?;
            let mut tokens = self.tokens.lock();
            if !tokens.contains_key(&candidate) {
                tokens.insert(candidate.clone(), user);
                break candidate;
            }
        };
        tracing::debug!("login token issued");
        Ok(token)
    }

    /// Removes the token and returns the user it was bound to.
    ///
    /// # Errors
    /// [`SessionError::TokenNotFound`] if the token was never issued, was
    /// already consumed, or was revoked.
    pub fn consume(&self, token: &str) -> Result<Arc<User>, SessionError> {
        self.tokens
            .lock()
            .remove(token)
            .ok_or(SessionError::TokenNotFound)
    }

    /// Invalidates a token without using it. No-op if it is not live.
    pub fn revoke(&self, token: &str) {
        if let Some(user) = self.tokens.lock().remove(token) {
            tracing::debug!(username = %user.username(), "login token revoked");
        }
    }

    /// Returns the number of live tokens.
    pub fn len(&self) -> usize {
        self.tokens.lock().len()
    }

    /// Returns `true` if no token is live.
    pub fn is_empty(&self) -> bool {
        self.tokens.lock().is_empty()
    }
}

impl Authenticator for TokenStore {
    async fn authenticate(&self, token: &str) -> Result<Arc<User>, SessionError> {
        self.consume(token)
    }
}

/// Draws [`TOKEN_BYTES`] from the OS and hex-encodes them.
///
/// `OsRng` is used directly (rather than a thread-local generator) so a
/// failing entropy source surfaces as an error instead of a panic.
fn generate_token() -> Result<String, SessionError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| SessionError::RandomnessUnavailable(e.to_string()))?;
    Ok(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

// =========================================================================
// Tests
// =========================================================================
