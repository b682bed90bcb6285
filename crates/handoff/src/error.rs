//! Unified error type for the handoff server.

use handoff_transport::TransportError;

/// Top-level error returned when starting or running the server.
///
/// Request-level failures never reach this type: they become HTTP
/// responses through [`ApiError`](crate::ApiError) or end a single
/// connection inside its handler.
#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    /// A transport-level error (the listener could not bind).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The HTTP server itself failed.
    #[error("server failed: {0}")]
    Io(#[from] std::io::Error),
}
