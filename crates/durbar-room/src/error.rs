//! Error types for room membership and registry operations.

use durbar_game::GameError;
use durbar_protocol::{ErrorKind, PlayerId, RoomId};

/// Errors surfaced to clients through intent acknowledgements.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("room {0} not found")]
    NotFound(RoomId),

    #[error("player {0} is not in any room")]
    NotInAnyRoom(PlayerId),

    /// A player occupies at most one room at a time.
    #[error("player {0} is already in a room")]
    AlreadyInRoom(PlayerId),

    /// Joining a room the player is already seated in.
    #[error("player {0} is already in this room")]
    AlreadyInThisRoom(PlayerId),

    #[error("room is full")]
    RoomFull,

    #[error("incorrect password")]
    WrongPassword,

    /// Names are unique per room, compared case-insensitively.
    #[error("the name {0:?} is already taken in this room")]
    DuplicateName(String),

    /// Rooms only accept members while waiting for a game to start.
    #[error("the game in this room has already started")]
    NotJoinable,

    #[error("player {0} is not the room creator")]
    NotCreator(PlayerId),

    #[error("invalid player name: {0}")]
    InvalidName(String),

    #[error("invalid room size {0}")]
    InvalidMaxPlayers(usize),

    #[error("the server is at its room limit")]
    ServerFull,

    /// The room actor went away mid-request.
    #[error("room is shutting down")]
    Unavailable,

    #[error(transparent)]
    Game(#[from] GameError),
}

impl RoomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::NotInAnyRoom(_) => ErrorKind::NotFound,
            Self::AlreadyInRoom(_) | Self::AlreadyInThisRoom(_) | Self::DuplicateName(_) => {
                ErrorKind::Conflict
            }
            Self::RoomFull | Self::ServerFull => ErrorKind::Capacity,
            Self::WrongPassword | Self::NotCreator(_) => ErrorKind::Forbidden,
            Self::NotJoinable | Self::Unavailable => ErrorKind::StateConflict,
            Self::InvalidName(_) | Self::InvalidMaxPlayers(_) => ErrorKind::Validation,
            Self::Game(game) => game.kind(),
        }
    }
}
