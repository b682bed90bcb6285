//! Per-connection handler: token check, registration, and the echo loop.
//!
//! Every connect request walks the same states:
//!
//! ```text
//! AwaitingToken ──authenticate()──→ Authenticated ──register()──→ Connected ──run()──→ Closed
//!       │                                                             │
//!       └── bad token: 401, nothing registered                        └── peer close, fatal error,
//!                                                                         or server shutdown
//! ```
//!
//! Each state is its own type, so a connection cannot reach the echo loop
//! without first spending a token and appearing in the registry.

use std::sync::Arc;

use handoff_protocol::{Codec, Event};
use handoff_session::{ActiveSessionRegistry, Authenticator, SessionError, User};
use handoff_transport::{Connection, ConnectionId};
use tokio::sync::watch;

/// Why a connected session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client closed the connection or it dropped.
    PeerClosed,
    /// A send or receive failed and the connection is unusable.
    TransportFailed,
    /// The server is shutting down.
    Shutdown,
}

/// A connect request whose token has been consumed.
#[derive(Debug)]
pub struct Authenticated {
    user: Arc<User>,
}

/// Spends `token` and binds the request to the user it was issued for.
///
/// This is the only way out of the awaiting-token state. On failure no
/// state anywhere has changed except that a presented live token is gone.
///
/// # Errors
/// Whatever the authenticator rejects the token with, usually
/// [`SessionError::TokenNotFound`].
pub async fn authenticate<A: Authenticator>(
    auth: &A,
    token: &str,
) -> Result<Authenticated, SessionError> {
    let user = auth.authenticate(token).await?;
    tracing::debug!(username = %user.username(), "connect token accepted");
    Ok(Authenticated { user })
}

impl Authenticated {
    /// The user the token belonged to.
    pub fn user(&self) -> &Arc<User> {
        &self.user
    }

    /// Assigns a connection handle and records the user as active.
    ///
    /// The returned [`Connected`] owns the registry entry: dropping it,
    /// whether after [`Connected::run`] or because the upgrade never
    /// happened, removes the entry again.
    pub fn register(self, registry: Arc<ActiveSessionRegistry>) -> Connected {
        let connection = ConnectionId::next();
        registry.add(self.user.username(), connection);
        Connected {
            user: self.user,
            connection,
            registry,
        }
    }
}

/// A registered session waiting for, or running, its echo loop.
///
/// Removes its registry entry on drop, which covers every exit path
/// including panics in the loop.
pub struct Connected {
    user: Arc<User>,
    connection: ConnectionId,
    registry: Arc<ActiveSessionRegistry>,
}

impl Connected {
    /// The handle this session is registered under.
    pub fn connection_id(&self) -> ConnectionId {
        self.connection
    }

    /// The connected user.
    pub fn user(&self) -> &Arc<User> {
        &self.user
    }

    /// Runs the echo loop on `conn` until it closes.
    ///
    /// Frames that do not decode are logged and skipped. A send failure
    /// that leaves the connection usable is logged and skipped too. The
    /// loop ends when the peer closes, the transport fails, or `shutdown`
    /// flips to `true` (or its sender goes away), in which case the server
    /// closes the connection itself.
    ///
    /// The registry entry is removed before `conn` is released.
    pub async fn run<C, K>(
        self,
        conn: C,
        codec: &K,
        mut shutdown: watch::Receiver<bool>,
    ) -> CloseReason
    where
        C: Connection,
        K: Codec,
    {
        let username = self.user.username().to_string();
        let conn_id = self.connection;
        tracing::info!(%username, %conn_id, "session connected");

        let reason = loop {
            let data = tokio::select! {
                received = conn.recv() => match received {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%username, %conn_id, "connection closed by peer");
                        break CloseReason::PeerClosed;
                    }
                    Err(e) => {
                        tracing::debug!(%username, %conn_id, error = %e, "recv error");
                        break CloseReason::TransportFailed;
                    }
                },
                () = shutdown_requested(&mut shutdown) => {
                    tracing::info!(%username, %conn_id, "closing connection for shutdown");
                    if let Err(e) = conn.close().await {
                        tracing::debug!(%conn_id, error = %e, "close failed");
                    }
                    break CloseReason::Shutdown;
                }
            };

            let event: Event = match codec.decode(&data) {
                Ok(event) => event,
                Err(e) => {
                    tracing::debug!(%username, %conn_id, error = %e, "failed to decode event");
                    continue;
                }
            };
            tracing::debug!(%conn_id, event = event.name(), "event received");

            let Some(reply) = dispatch(event) else {
                continue;
            };
            let bytes = match codec.encode(&reply) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(%conn_id, error = %e, "failed to encode reply");
                    continue;
                }
            };
            if let Err(e) = conn.send(&bytes).await {
                if e.is_fatal() {
                    tracing::debug!(%username, %conn_id, error = %e, "send failed, closing");
                    break CloseReason::TransportFailed;
                }
                tracing::warn!(%username, %conn_id, error = %e, "send failed");
            }
        };

        drop(self);
        drop(conn);
        tracing::info!(%username, %conn_id, ?reason, "session closed");
        reason
    }
}

impl Drop for Connected {
    fn drop(&mut self) {
        self.registry
            .remove_connection(self.user.username(), self.connection);
    }
}

/// Maps an inbound event to the reply it produces, if any.
fn dispatch(event: Event) -> Option<Event> {
    match event {
        Event::Echo(data) => Some(Event::Echo(data)),
    }
}

/// Resolves once shutdown is requested or the server state is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
