//! In-process duplex channel.
//!
//! [`MemoryConnection::pair`] returns two connected endpoints: whatever one
//! side sends, the other receives. Closing either side ends the stream for
//! both.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, Mutex, Notify};

use crate::{Connection, ConnectionId, TransportError};

/// One endpoint of an in-memory duplex channel.
pub struct MemoryConnection {
    id: ConnectionId,
    outbound: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    closed: AtomicBool,
    close_signal: Notify,
}

impl MemoryConnection {
    /// Creates two endpoints wired to each other.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (Self::new(a_tx, a_rx), Self::new(b_tx, b_rx))
    }

    fn new(
        outbound: mpsc::UnboundedSender<Vec<u8>>,
        inbound: mpsc::UnboundedReceiver<Vec<u8>>,
    ) -> Self {
        Self {
            id: ConnectionId::next(),
            outbound: Mutex::new(Some(outbound)),
            inbound: Mutex::new(inbound),
            closed: AtomicBool::new(false),
            close_signal: Notify::new(),
        }
    }
}

impl Connection for MemoryConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let outbound = self.outbound.lock().await;
        let sender = outbound.as_ref().ok_or_else(|| {
            TransportError::ConnectionClosed(self.id.to_string())
        })?;
        sender.send(data.to_vec()).map_err(|_| {
            TransportError::ConnectionClosed(format!("{} peer gone", self.id))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        // Register for the close signal before checking the flag so a
        // concurrent `close` cannot slip between the two.
        let closed = self.close_signal.notified();
        if self.closed.load(Ordering::Acquire) {
            return Ok(None);
        }
        let mut inbound = self.inbound.lock().await;
        tokio::select! {
            msg = inbound.recv() => Ok(msg),
            _ = closed => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::Release);
        // Dropping our sender ends the peer's stream.
        self.outbound.lock().await.take();
        self.close_signal.notify_waiters();
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
