//! The active session registry: who is connected right now.
//!
//! Each connection handler adds its user when the handshake completes and
//! removes it when the connection ends. The HTTP active-list query reads a
//! snapshot. Nothing else touches it.
//!
//! # Concurrency note
//!
//! Unlike a registry owned by a single accept loop, this one is written to
//! from every connection task at once, so it carries its own lock. Every
//! lock is held for exactly one map operation and never across an `.await`.

use std::collections::HashMap;

use handoff_transport::ConnectionId;
use parking_lot::RwLock;

use crate::{ActiveSession, SessionError};

/// Tracks the live connection of every connected user.
///
/// ## Lifecycle
///
/// ```text
/// handshake ok ──→ add() ──→ [connected] ──→ connection ends ──→ remove_connection()
///                              │
///                              └── same user connects again ──→ add() replaces entry
/// ```
///
/// At most one session per username. A second connect for the same user
/// overwrites the entry; the older connection stays open but is no longer
/// tracked.
#[derive(Default)]
pub struct ActiveSessionRegistry {
    sessions: RwLock<HashMap<String, ActiveSession>>,
}

impl ActiveSessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the session for `username`.
    ///
    /// Returns the session that was replaced, if any.
    pub fn add(
        &self,
        username: &str,
        connection: ConnectionId,
    ) -> Option<ActiveSession> {
        let session = ActiveSession::new(username, connection);
        let replaced = self.sessions.write().insert(username.to_string(), session);

        match &replaced {
            Some(old) => tracing::info!(
                %username,
                %connection,
                previous = %old.connection,
                "session replaced by newer connection"
            ),
            None => tracing::info!(%username, %connection, "session added"),
        }
        replaced
    }

    /// Deletes the session for `username`. No-op if there is none.
    pub fn remove(&self, username: &str) -> Option<ActiveSession> {
        let removed = self.sessions.write().remove(username);
        if let Some(session) = &removed {
            tracing::info!(
                %username,
                connected_for = ?session.connected_for(),
                "session removed"
            );
        }
        removed
    }

    /// Deletes the session for `username` only if it is still bound to
    /// `connection`.
    ///
    /// Connection handlers clean up through this, so an old connection
    /// closing after its user reconnected cannot remove the newer session.
    /// Returns `true` if an entry was removed.
    pub fn remove_connection(
        &self,
        username: &str,
        connection: ConnectionId,
    ) -> bool {
        let mut sessions = self.sessions.write();
        let owned = sessions
            .get(username)
            .is_some_and(|s| s.connection == connection);
        let removed = if owned { sessions.remove(username) } else { None };
        drop(sessions);

        match &removed {
            Some(session) => tracing::info!(
                %username,
                %connection,
                connected_for = ?session.connected_for(),
                "session removed"
            ),
            None => tracing::debug!(
                %username,
                %connection,
                "session already replaced, nothing to remove"
            ),
        }
        removed.is_some()
    }

    /// Looks up the session for `username`.
    ///
    /// # Errors
    /// [`SessionError::SessionNotFound`] if the user is not connected.
    pub fn get(&self, username: &str) -> Result<ActiveSession, SessionError> {
        self.sessions
            .read()
            .get(username)
            .cloned()
            .ok_or_else(|| SessionError::SessionNotFound(username.to_string()))
    }

    /// Snapshot of the currently connected usernames, sorted.
    pub fn list_usernames(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.sessions.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of connected users.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns `true` if nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
