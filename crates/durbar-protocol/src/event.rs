//! Outbound server events and the intent acknowledgement envelope.
//!
//! Events replace the source of truth on the client, so names and payload
//! field casing here are the contract. Adjacently tagged JSON:
//! `{ "event": "guessResult", "data": { ... } }`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{GameResults, PlayerId, PlayerView, Role, RoomId, RoomSummary, RoomView};

/// Every event the server can push to clients.
///
/// Broadcast to all room members unless noted private. Lobby-scoped events
/// (`roomListUpdated`, `roomDeleted`) go to every registered connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    // -- Lobby / membership --
    RoomListUpdated {
        rooms: Vec<RoomSummary>,
    },

    /// Sent to the existing members; the joiner gets the room in their ack.
    PlayerJoined {
        player: PlayerView,
        room: RoomView,
    },

    PlayerLeft {
        player_id: PlayerId,
        room: RoomView,
        was_creator: bool,
    },

    RoomDeleted {
        room_id: RoomId,
    },

    // -- Game start --
    GameStartCountdown {
        countdown: u32,
    },

    GameActuallyStarted {
        current_round: u32,
        max_rounds: u32,
        players: Vec<PlayerView>,
        mantri_player: PlayerView,
    },

    /// Private, per player: the hidden role card for this round.
    YourCard {
        card: Role,
        round: u32,
    },

    // -- Round progress --
    RoundTimerUpdate {
        time_remaining: u32,
        round: u32,
    },

    RoundTimeout {
        round_scores: HashMap<PlayerId, u32>,
        total_scores: HashMap<PlayerId, u32>,
        cards: HashMap<PlayerId, Role>,
        chor_player: PlayerView,
    },

    GuessResult {
        is_correct: bool,
        guessed_player: PlayerView,
        chor_player: PlayerView,
        round_scores: HashMap<PlayerId, u32>,
        total_scores: HashMap<PlayerId, u32>,
        cards: HashMap<PlayerId, Role>,
    },

    NextRoundCountdown {
        countdown: u32,
    },

    NextRoundActuallyStarted {
        current_round: u32,
        mantri_player: PlayerView,
    },

    // -- Game end / rematch --
    GameFinished {
        results: GameResults,
    },

    GameForceEnded {
        reason: String,
        results: GameResults,
    },

    PlayAgainUpdate {
        player_id: PlayerId,
        accepted: bool,
        all_accepted: bool,
    },

    GameReset {
        players: Vec<PlayerView>,
    },
}

// ---------------------------------------------------------------------------
// Ack: the correlated reply to every intent
// ---------------------------------------------------------------------------

/// Acknowledgement for one intent: `{ "success": true, ...payload }` or
/// `{ "success": false, "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Intent-specific payload, flattened into the top-level object.
    #[serde(flatten)]
    pub data: serde_json::Value,
}

impl Ack {
    /// A bare success with no payload.
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            data: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// A success carrying a payload object.
    ///
    /// `data` must serialize to a JSON object so it can flatten cleanly;
    /// anything else is a programming error and falls back to an empty
    /// payload.
    pub fn with(data: impl Serialize) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(value @ serde_json::Value::Object(_)) => value,
            _ => serde_json::Value::Object(serde_json::Map::new()),
        };
        Self {
            success: true,
            error: None,
            data,
        }
    }

    /// A failure carrying the error message.
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}
