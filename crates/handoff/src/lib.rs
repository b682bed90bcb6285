//! # Handoff
//!
//! Hands a logged-in HTTP client over to a live WebSocket connection.
//!
//! A client registers (`POST /user`), logs in (`POST /user/login`) and
//! receives a connect URL carrying a single-use token. Opening that URL
//! (`GET /ws?token=…`) spends the token, upgrades to a WebSocket, and
//! lists the user as active (`GET /user/active/list`) until the connection
//! closes. While connected, every `echo` event is sent straight back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use handoff::prelude::*;
//!
//! # async fn start() -> Result<(), HandoffError> {
//! let server = HandoffServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run_until(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! })
//! .await
//! # }
//! ```

mod config;
mod error;
pub mod handler;
mod routes;
mod server;

pub use config::ServerConfig;
pub use error::HandoffError;
pub use routes::{ApiError, RATE_LIMIT, TOKEN_TTL_HOURS};
pub use server::{HandoffServer, HandoffServerBuilder};

/// Convenience re-exports for common usage.
///
/// ```rust
/// use handoff::prelude::*;
/// ```
pub mod prelude {
    pub use crate::handler::CloseReason;
    pub use crate::{HandoffError, HandoffServer, ServerConfig};

    pub use handoff_protocol::{Codec, ConnectUrl, Credentials, Event, JsonCodec, UserCreated};
    pub use handoff_session::{
        ActiveSessionRegistry, Authenticator, CredentialHasher, CredentialStore, SessionError,
        TokenStore, User, UserDirectory, UserId,
    };
    pub use handoff_transport::{Connection, ConnectionId, TransportError};
}
