//! durbar: a real-time server core for the Raja Mantri Chor Sipahi card
//! game. Four players per room, five rounds per game, one hidden role
//! card each per round.
//!
//! The workspace splits along its seams:
//!
//! - `durbar-protocol`: the wire contract (intents, events, views)
//! - `durbar-game`: the round state machine, dealing, and scoring
//! - `durbar-room`: rooms, per-room actors, and the registry
//! - `durbar-timer`: cancellable countdowns feeding the actors
//!
//! This crate ties them together behind [`Gateway`], the single surface a
//! transport integrates against.

mod error;
mod gateway;
pub mod telemetry;

pub use error::DurbarError;
pub use gateway::Gateway;

pub use durbar_game::{GameConfig, GameError};
pub use durbar_protocol as protocol;
pub use durbar_room::{EventSender, Player, RegistryConfig, RoomError};
