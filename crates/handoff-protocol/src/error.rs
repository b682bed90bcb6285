//! Error types for the protocol layer.
//!
//! Each crate in handoff defines its own error enum. A `ProtocolError`
//! means the bytes themselves were wrong: they did not decode, or they
//! decoded into something that breaks a protocol rule.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, an unknown event name, or a frame
    /// truncated in transit.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A request body could not be parsed as a credentials object.
    #[error("invalid body")]
    InvalidBody,

    /// The user name is shorter than [`MIN_USER_NAME_LEN`](crate::MIN_USER_NAME_LEN).
    #[error("username should be {} chars or longer", crate::MIN_USER_NAME_LEN)]
    UserNameTooShort,

    /// The password is shorter than [`MIN_PASSWORD_LEN`](crate::MIN_PASSWORD_LEN).
    #[error("password should be {} chars or longer", crate::MIN_PASSWORD_LEN)]
    PasswordTooShort,
}

impl ProtocolError {
    /// Returns `true` for errors caused by a caller-supplied request body.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidBody | Self::UserNameTooShort | Self::PasswordTooShort
        )
    }
}
