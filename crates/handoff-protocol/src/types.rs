//! Protocol types: everything that crosses the wire.
//!
//! Two families live here:
//!
//! - [`Event`], the tagged messages exchanged over a live duplex
//!   connection once the handshake has completed.
//! - The JSON bodies of the HTTP surface: [`Credentials`] (request),
//!   [`UserCreated`] and [`ConnectUrl`] (responses).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Minimum user name length, in characters.
pub const MIN_USER_NAME_LEN: usize = 4;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

// ---------------------------------------------------------------------------
// Event: messages on a live connection
// ---------------------------------------------------------------------------

/// A message exchanged over an established duplex connection.
///
/// On the wire every event is an object with the event name under `name`
/// and its payload under `data`:
///
/// ```json
/// { "name": "echo", "data": { "text": "hello" } }
/// ```
///
/// Adding a new event type means adding a variant here and an arm in the
/// server's dispatch; the connection lifecycle does not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data", rename_all = "lowercase")]
pub enum Event {
    /// Client → Server → Client: the payload is reflected back verbatim.
    Echo(serde_json::Value),
}

impl Event {
    /// Returns the event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Echo(_) => "echo",
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials: POST /user and POST /user/login
// ---------------------------------------------------------------------------

/// A validated user name / password pair.
///
/// `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_name: String,
    pub password: String,
}

impl Credentials {
    /// Parses and validates a JSON request body.
    ///
    /// # Errors
    /// - [`ProtocolError::InvalidBody`] if the body is not a JSON object
    ///   whose values are all strings (extra string fields are ignored)
    /// - [`ProtocolError::UserNameTooShort`] if `userName` is missing or
    ///   shorter than [`MIN_USER_NAME_LEN`]
    /// - [`ProtocolError::PasswordTooShort`] if `password` is missing or
    ///   shorter than [`MIN_PASSWORD_LEN`]
    pub fn from_json(body: &[u8]) -> Result<Self, ProtocolError> {
        // Every field must be a string, known or not. Missing fields are
        // left to the length rules (an absent name is "too short").
        let mut raw: HashMap<String, String> = serde_json::from_slice(body)
            .map_err(|_| ProtocolError::InvalidBody)?;

        let user_name = raw.remove("userName").unwrap_or_default();
        if user_name.chars().count() < MIN_USER_NAME_LEN {
            return Err(ProtocolError::UserNameTooShort);
        }

        let password = raw.remove("password").unwrap_or_default();
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ProtocolError::PasswordTooShort);
        }

        Ok(Self {
            user_name,
            password,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// Body of `201 Created` for `POST /user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreated {
    pub id: String,
    #[serde(rename = "userName")]
    pub user_name: String,
}

/// Body of `201 Created` for `POST /user/login`: where to connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectUrl {
    pub url: String,
}

// =========================================================================
// Tests
// =========================================================================
