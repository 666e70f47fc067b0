//! Top-level error type, folding the per-crate errors into one surface.

use durbar_game::GameError;
use durbar_protocol::{ErrorKind, ProtocolError};
use durbar_room::RoomError;

#[derive(Debug, thiserror::Error)]
pub enum DurbarError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Game(#[from] GameError),

    /// The caller never registered a connection.
    #[error("not connected")]
    NotConnected,
}

impl DurbarError {
    /// Classification carried in failure acknowledgements.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Protocol(_) => ErrorKind::Validation,
            Self::Room(room) => room.kind(),
            Self::Game(game) => game.kind(),
            Self::NotConnected => ErrorKind::Forbidden,
        }
    }
}
