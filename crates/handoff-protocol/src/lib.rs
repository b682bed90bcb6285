//! Wire protocol for handoff.
//!
//! This crate defines what travels between clients and the server:
//!
//! - **Events** ([`Event`]): tagged messages exchanged over a live duplex
//!   connection.
//! - **Request/response bodies** ([`Credentials`], [`UserCreated`],
//!   [`ConnectUrl`]): the JSON shapes of the HTTP surface, including the
//!   field-length rules for credentials.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events are converted
//!   to and from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about connections, users, or tokens.
//!
//! ```text
//! Transport (bytes) → Protocol (Event) → Handshake (user context)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ConnectUrl, Credentials, Event, UserCreated, MIN_PASSWORD_LEN,
    MIN_USER_NAME_LEN,
};
