//! The user directory: every registered user, keyed by name.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{CredentialHasher, CredentialStore, SessionError, User, UserId};

/// In-memory store of registered users.
///
/// Lives as long as the process. Registering a name that already exists
/// replaces the previous user (and gives the name a new id); there is no
/// update or delete.
///
/// Hashing happens before the write lock is taken, so a slow Argon2 run
/// never blocks lookups.
pub struct UserDirectory {
    users: RwLock<HashMap<String, Arc<User>>>,
    hasher: CredentialHasher,
}

impl UserDirectory {
    /// Creates an empty directory using default Argon2id parameters.
    pub fn new() -> Self {
        Self::with_hasher(CredentialHasher::default())
    }

    /// Creates an empty directory with a custom hasher.
    pub fn with_hasher(hasher: CredentialHasher) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            hasher,
        }
    }

    /// Looks the user up and checks `secret` against the stored hash.
    ///
    /// # Errors
    /// - [`SessionError::UserNotFound`]: no such user
    /// - [`SessionError::InvalidCredentials`]: the secret does not match
    pub fn authenticate(
        &self,
        username: &str,
        secret: &str,
    ) -> Result<Arc<User>, SessionError> {
        let user = self.get(username)?;
        if !self.hasher.verify(secret, user.credential()) {
            return Err(SessionError::InvalidCredentials(username.to_string()));
        }
        Ok(user)
    }

    /// Returns the number of registered users.
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Returns `true` if nobody has registered yet.
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for UserDirectory {
    fn add(&self, username: &str, secret: &str) -> Result<UserId, SessionError> {
        let credential = self.hasher.hash(secret)?;
        let user = Arc::new(User::new(username, credential));
        let id = user.id();

        let replaced = self.users.write().insert(username.to_string(), user);
        if replaced.is_some() {
            tracing::info!(%username, %id, "user re-registered, previous record replaced");
        } else {
            tracing::info!(%username, %id, "user registered");
        }
        Ok(id)
    }

    fn get(&self, username: &str) -> Result<Arc<User>, SessionError> {
        self.users
            .read()
            .get(username)
            .cloned()
            .ok_or_else(|| SessionError::UserNotFound(username.to_string()))
    }
}
