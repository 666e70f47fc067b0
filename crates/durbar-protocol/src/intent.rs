//! Inbound client intents.
//!
//! Every intent is answered with a correlated [`Ack`](crate::Ack); state
//! changes additionally produce broadcast [`ServerEvent`](crate::ServerEvent)s.

use serde::{Deserialize, Serialize};

use crate::{PlayerId, RoomFilter, RoomId};

/// Everything a client can ask the server to do.
///
/// Internally tagged JSON: `{ "intent": "makeGuess", "guessedPlayerId": 3 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientIntent {
    /// Create a room and take the creator seat.
    CreateRoom {
        password: Option<String>,
        #[serde(default = "default_max_players")]
        max_players: usize,
    },

    /// Join an existing room by its code.
    JoinRoom {
        room_id: RoomId,
        password: Option<String>,
    },

    /// Leave the current room.
    LeaveRoom,

    /// List rooms visible in the lobby.
    GetRooms {
        #[serde(default)]
        filters: RoomFilter,
    },

    /// Snapshot of the caller's current room and game phase.
    GetRoomState,

    /// Start the game (creator only, exactly four players seated).
    StartGame,

    /// The Mantri names the player they believe holds the Chor card.
    MakeGuess { guessed_player_id: PlayerId },

    /// Manual fallback: skip the next-round countdown and deal now.
    NextRound,

    /// Accept or decline a rematch after the game finishes.
    PlayAgainResponse { accepted: bool },

    /// Final standings of the caller's game.
    GetResults,

    /// Process-wide room/player counters.
    GetServerStats,
}

fn default_max_players() -> usize {
    4
}
