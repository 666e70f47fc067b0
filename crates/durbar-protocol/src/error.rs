//! Protocol-level errors and the intent-boundary error taxonomy.

use std::fmt;

/// Errors produced while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// The bytes are malformed or don't match the expected shape.
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),

    /// Structurally valid but semantically unacceptable input.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

/// Classification of every error surfaced through an ack.
///
/// All failures are recovered at the intent boundary into one of these
/// kinds; none may crash the serving process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input: bad name length, bad password, wrong player count.
    Validation,
    /// Room, player, or request absent.
    NotFound,
    /// Duplicate name/id, already in a room.
    Conflict,
    /// Wrong password, not creator, not the Mantri, self-target.
    Forbidden,
    /// Room or server full.
    Capacity,
    /// Action invalid for the current room/game state.
    StateConflict,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::NotFound => "notFound",
            Self::Conflict => "conflict",
            Self::Forbidden => "forbidden",
            Self::Capacity => "capacity",
            Self::StateConflict => "stateConflict",
        };
        f.write_str(name)
    }
}
