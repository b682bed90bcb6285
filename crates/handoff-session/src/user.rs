//! The user record.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier assigned to a user at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generates a new random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A registered user.
///
/// Immutable once created. The credential is an Argon2id PHC string, never
/// the secret itself. Records are shared as `Arc<User>` between the
/// directory and any tokens issued for them.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: String,
    credential: String,
}

impl User {
    /// Builds a user from a name and an already hashed credential.
    pub fn new(username: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            id: UserId::generate(),
            username: username.into(),
            credential: credential.into(),
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The stored credential hash (PHC string format).
    pub fn credential(&self) -> &str {
        &self.credential
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
