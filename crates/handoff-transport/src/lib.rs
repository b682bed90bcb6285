//! Duplex channel abstraction for handoff.
//!
//! Provides the [`Connection`] trait: a bidirectional, message-oriented
//! channel with receive/send/close operations. The upgrade handshake and
//! framing belong to whatever transport produced the connection; the
//! session layer above only ever sees this trait.
//!
//! # Implementations
//!
//! - [`WebSocketConnection`]: an upgraded axum WebSocket (feature
//!   `websocket`, enabled by default)
//! - [`MemoryConnection`]: an in-process channel pair, used in tests and
//!   anywhere a real socket is not wanted

mod error;
mod memory;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use memory::MemoryConnection;
#[cfg(feature = "websocket")]
pub use websocket::WebSocketConnection;

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection.
///
/// This is the handle the session registry keeps for a connected user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates a process-unique `ConnectionId`.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A single duplex connection that can send and receive messages.
///
/// The returned futures are `Send` so a connection can be driven from any
/// task of a multi-threaded runtime, including from generic code.
pub trait Connection: Send + Sync + 'static {
    /// Sends one message to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next message from the remote peer.
    ///
    /// Suspends until a message arrives. Returns `Ok(None)` once the
    /// connection is closed, by either side.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Closes the connection.
    ///
    /// A task suspended in [`recv`](Self::recv) observes the close and
    /// returns `Ok(None)`.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
