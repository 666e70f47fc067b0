//! Error types for game operations.

use durbar_protocol::{ErrorKind, PlayerId};

/// Errors that can occur while driving a game session.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The game needs exactly four seated players to start.
    #[error("need exactly {expected} players to start, have {actual}")]
    WrongPlayerCount { expected: usize, actual: usize },

    /// A game is already underway in this room.
    #[error("a game is already in progress")]
    AlreadyPlaying,

    /// No round is currently accepting guesses.
    #[error("no round is in progress")]
    NotInProgress,

    /// Only the current Mantri may guess.
    #[error("player {0} does not hold the Mantri card")]
    NotMantri(PlayerId),

    /// The guessed player is not seated in this game.
    #[error("player {0} is not in this game")]
    InvalidTarget(PlayerId),

    /// The Mantri cannot guess themself.
    #[error("the Mantri cannot guess themself")]
    SelfGuess,

    /// The player is not a member of this room.
    #[error("player {0} is not in this room")]
    NotInRoom(PlayerId),

    /// Play-again responses are only valid once the game has finished.
    #[error("the game has not finished")]
    NotFinished,

    /// Manual round advance is only valid during the next-round countdown.
    #[error("no round countdown to skip")]
    NoCountdownToSkip,
}

impl GameError {
    /// Classification surfaced through the intent acknowledgement.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::WrongPlayerCount { .. } => ErrorKind::Validation,
            Self::AlreadyPlaying | Self::NotInProgress | Self::NotFinished => {
                ErrorKind::StateConflict
            }
            Self::NoCountdownToSkip => ErrorKind::StateConflict,
            Self::NotMantri(_) | Self::SelfGuess => ErrorKind::Forbidden,
            Self::InvalidTarget(_) | Self::NotInRoom(_) => ErrorKind::NotFound,
        }
    }
}
