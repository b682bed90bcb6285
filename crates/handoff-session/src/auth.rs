//! Seams between the stores and the code that uses them.
//!
//! The server never names a concrete store where a trait will do. The two
//! traits here let handlers and the connection handshake run against
//! mocks in tests, and let a persistent backend replace the in-memory maps
//! without touching the server.

use std::future::Future;
use std::sync::Arc;

use crate::{SessionError, User, UserId};

/// Exchanges a login token for the identity it was issued to.
///
/// Called once per connect attempt, before the connection is accepted.
/// Implementations must be single-use: a token that authenticated once
/// must fail every later call.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use handoff_session::{Authenticator, SessionError, User};
///
/// /// Rejects every token. Handy for testing the unauthorized path.
/// struct RejectAll;
///
/// impl Authenticator for RejectAll {
///     async fn authenticate(
///         &self,
///         _token: &str,
///     ) -> Result<Arc<User>, SessionError> {
///         Err(SessionError::TokenNotFound)
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates and consumes the given token.
    ///
    /// # Returns
    /// - `Ok(user)`: the token was live; it is now spent
    /// - `Err(SessionError::TokenNotFound)`: never issued, already used,
    ///   or revoked
    fn authenticate(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Arc<User>, SessionError>> + Send;
}

/// Stores users and looks them up by name.
pub trait CredentialStore: Send + Sync + 'static {
    /// Registers a user, replacing any previous user of the same name.
    ///
    /// Returns the freshly generated id.
    fn add(&self, username: &str, secret: &str) -> Result<UserId, SessionError>;

    /// Looks up a user by name.
    ///
    /// # Errors
    /// [`SessionError::UserNotFound`] if no such user is registered.
    fn get(&self, username: &str) -> Result<Arc<User>, SessionError>;
}
