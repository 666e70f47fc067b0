//! Identity types, role cards, and the public views that travel on the wire.
//!
//! Everything here is part of the client contract: field names and casing
//! must stay bit-exact, because clients render directly from these shapes.

use std::collections::HashMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable, opaque identifier for a player.
///
/// Issued by the external identity provider before any room intent is
/// processed. Newtype over `u64`; `#[serde(transparent)]` so a
/// `PlayerId(42)` serializes as plain `42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A short join code identifying a room.
///
/// Six characters from an alphabet without visually ambiguous glyphs
/// (no `0`/`O`, no `1`/`I`), so players can read codes aloud.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    const ALPHABET: &'static [u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    const LEN: usize = 6;

    /// Generates a fresh random room code.
    ///
    /// Uniqueness is NOT guaranteed here; the registry checks for
    /// collisions against its live room map.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let code = (0..Self::LEN)
            .map(|_| {
                let i = rng.random_range(0..Self::ALPHABET.len());
                Self::ALPHABET[i] as char
            })
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Role cards
// ---------------------------------------------------------------------------

/// The four hidden role cards, one of each dealt per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Raja,
    Mantri,
    Chor,
    Sipahi,
}

impl Role {
    /// All four roles, in the order they are shuffled for a deal.
    pub const ALL: [Role; 4] = [Role::Raja, Role::Mantri, Role::Chor, Role::Sipahi];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Raja => "Raja",
            Role::Mantri => "Mantri",
            Role::Chor => "Chor",
            Role::Sipahi => "Sipahi",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Lifecycle states
// ---------------------------------------------------------------------------

/// Coarse room lifecycle, as shown in room listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    Waiting,
    Playing,
    Finished,
}

impl RoomState {
    /// A room only accepts new members while waiting.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// Fine-grained game phase driven by the per-room state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    Waiting,
    CountingDown,
    Playing,
    RoundResolving,
    RoundCountdown,
    Finished,
}

impl GamePhase {
    /// Whether a game is underway (anything past waiting, short of finished).
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Waiting | Self::Finished)
    }

    /// The coarse room state this phase maps to.
    pub fn room_state(&self) -> RoomState {
        match self {
            Self::Waiting => RoomState::Waiting,
            Self::Finished => RoomState::Finished,
            _ => RoomState::Playing,
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Waiting => "waiting",
            Self::CountingDown => "countingDown",
            Self::Playing => "playing",
            Self::RoundResolving => "roundResolving",
            Self::RoundCountdown => "roundCountdown",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive an event?
// ---------------------------------------------------------------------------

/// Delivery target for an outbound event.
///
/// The state machine returns `(Recipient, ServerEvent)` pairs; the room
/// actor fans them out over the member senders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every member of the room.
    All,
    /// One specific player (private events like `yourCard`).
    Player(PlayerId),
    /// Everyone except the specified player.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Public views
// ---------------------------------------------------------------------------

/// Public projection of a seated player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub is_creator: bool,
    pub games_played: u32,
    /// Epoch milliseconds.
    pub joined_at: u64,
}

/// Full public view of a room, sent to members on join/leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub room_id: RoomId,
    pub players: Vec<PlayerView>,
    pub player_count: usize,
    pub max_players: usize,
    pub state: RoomState,
    pub has_password: bool,
    /// Epoch milliseconds.
    pub created_at: u64,
}

/// Compact entry for lobby room listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub player_count: usize,
    pub max_players: usize,
    pub state: RoomState,
    pub has_password: bool,
}

/// Snapshot answering a `getRoomState` intent. Never exposes hidden cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStateView {
    pub room: RoomView,
    pub phase: GamePhase,
    pub current_round: u32,
    pub max_rounds: u32,
    pub total_scores: HashMap<PlayerId, u32>,
    /// Public knowledge once a round starts; `None` before the first deal.
    pub mantri_id: Option<PlayerId>,
}

/// One resolved round, appended to the session's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRecord {
    pub round: u32,
    /// `None` when the round deadline fired before a guess.
    pub guessed_player_id: Option<PlayerId>,
    pub correct: bool,
    pub timed_out: bool,
    pub mantri_id: PlayerId,
    pub chor_id: PlayerId,
    pub round_scores: HashMap<PlayerId, u32>,
}

/// A player's position in the final standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPlayer {
    /// 0-indexed; rank 0 is the winner.
    pub rank: usize,
    pub player_id: PlayerId,
    pub name: String,
    pub score: u32,
}

/// Final (or forced) game results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResults {
    /// Sorted by score descending; ties broken by join order.
    pub rankings: Vec<RankedPlayer>,
    pub winner: Option<RankedPlayer>,
    pub duration_ms: u64,
    pub rounds_played: u32,
    /// Total score ÷ (players × rounds played), rounded to nearest.
    pub average_score: u32,
}

/// Process-wide counters answering `getServerStats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStats {
    pub rooms: usize,
    pub players: usize,
    pub rooms_waiting: usize,
    pub rooms_playing: usize,
    pub rooms_finished: usize,
    pub uptime_ms: u64,
}

/// Filters for the `getRooms` intent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomFilter {
    /// Only list rooms that are waiting and have a free seat.
    pub joinable_only: bool,
}
