//! Error types for the session layer.

/// Errors that can occur while registering users, issuing and consuming
/// login tokens, or looking up live sessions.
///
/// The `*NotFound` variants are internal lookup misses. The server maps
/// them onto an HTTP status; they are never shown to a client verbatim.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No user is registered under this name.
    #[error("user {0} does not exist")]
    UserNotFound(String),

    /// The user exists but the supplied secret does not match.
    #[error("invalid credentials for user {0}")]
    InvalidCredentials(String),

    /// The token was never issued, was already consumed, or was revoked.
    #[error("token not found")]
    TokenNotFound,

    /// No active session exists for this user.
    #[error("no active session for user {0}")]
    SessionNotFound(String),

    /// The operating system's secure random source failed.
    #[error("secure randomness unavailable: {0}")]
    RandomnessUnavailable(String),

    /// Hashing a secret failed.
    #[error("credential hashing failed: {0}")]
    Hashing(String),
}

impl SessionError {
    /// Returns `true` for lookup misses (user, token, or session).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_) | Self::TokenNotFound | Self::SessionNotFound(_)
        )
    }
}
