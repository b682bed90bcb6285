//! Session types: the record that a user currently holds a connection.

use std::time::{Duration, Instant};

use handoff_transport::ConnectionId;

/// A user's live connection, as seen by the registry.
///
/// Created when a connect handshake succeeds, destroyed when that
/// connection terminates. `connection` is an opaque handle: the registry
/// never talks to the connection itself.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    /// Which user is connected.
    pub username: String,

    /// The connection the user is connected on.
    pub connection: ConnectionId,

    /// When the connection was registered. `Instant` is monotonic, so
    /// durations derived from it are immune to wall-clock changes.
    pub since: Instant,
}

impl ActiveSession {
    /// Creates a session record stamped with the current instant.
    pub fn new(username: impl Into<String>, connection: ConnectionId) -> Self {
        Self {
            username: username.into(),
            connection,
            since: Instant::now(),
        }
    }

    /// How long this connection has been open.
    pub fn connected_for(&self) -> Duration {
        self.since.elapsed()
    }
}
