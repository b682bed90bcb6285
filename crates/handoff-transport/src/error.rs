/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed and can no longer carry messages.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding the listening socket failed.
    #[error("bind failed: {0}")]
    BindFailed(#[source] std::io::Error),
}

impl TransportError {
    /// Returns `true` if the channel is unusable after this error.
    ///
    /// A failed send on an otherwise open channel is recoverable; a
    /// closed channel or a broken read side is not.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::SendFailed(_))
    }
}
