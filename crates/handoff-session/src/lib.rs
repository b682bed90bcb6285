//! User identity, login tokens, and live session tracking for handoff.
//!
//! This crate holds the server's shared state and the rules around it:
//!
//! 1. **Identity**: [`UserDirectory`] stores registered users and checks
//!    their credentials ([`CredentialStore`] seam, Argon2id hashes via
//!    [`CredentialHasher`]).
//! 2. **Login tokens**: [`TokenStore`] issues random single-use tokens and
//!    consumes them atomically ([`Authenticator`] seam).
//! 3. **Session tracking**: [`ActiveSessionRegistry`] knows which users
//!    currently hold an open connection.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)      ← HTTP routes and the connection handshake
//!     ↕
//! Session (this crate) ← users, tokens, who is connected
//!     ↕
//! Transport (below)   ← ConnectionId handles for live connections
//! ```
//!
//! Every store is safe to share between tasks: each one guards its map
//! with a `parking_lot` lock held for a single map operation only.

mod auth;
mod directory;
mod error;
mod password;
mod registry;
mod session;
mod tokens;
mod user;

pub use auth::{Authenticator, CredentialStore};
pub use directory::UserDirectory;
pub use error::SessionError;
pub use password::CredentialHasher;
pub use registry::ActiveSessionRegistry;
pub use session::ActiveSession;
pub use tokens::{TokenStore, TOKEN_BYTES};
pub use user::{User, UserId};
