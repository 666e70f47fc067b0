//! Rooms for durbar: the membership model, one actor task per room, and
//! the registry that tracks every live room.
//!
//! Rooms are identified by short join codes and hold up to a handful of
//! players; the four-seat game itself is driven by `durbar-game` inside
//! the room actor. The registry enforces the one-room-per-player rule
//! and sweeps rooms that have gone quiet.

mod actor;
mod config;
mod error;
mod password;
mod player;
mod registry;
mod room;

pub use actor::{EventSender, LeaveOutcome, RoomCommand, RoomHandle, RoomHealth};
pub use config::RegistryConfig;
pub use error::RoomError;
pub use password::PasswordHash;
pub use player::{Player, validate_name};
pub use registry::Registry;
pub use room::{Departure, Room};
