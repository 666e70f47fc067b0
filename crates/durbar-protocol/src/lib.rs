//! Wire contract for the durbar game server.
//!
//! Defines everything that crosses the network boundary: identity
//! newtypes, the role cards, public views, inbound [`ClientIntent`]s,
//! outbound [`ServerEvent`]s, the [`Ack`] envelope, and the [`Codec`]
//! abstraction. Event names and payload field casing are bit-exact with
//! what clients render, so changes here are protocol changes.

mod codec;
mod error;
mod event;
mod intent;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::{ErrorKind, ProtocolError};
pub use event::{Ack, ServerEvent};
pub use intent::ClientIntent;
pub use types::{
    GamePhase, GameResults, PlayerId, PlayerView, RankedPlayer, Recipient, Role, RoomFilter,
    RoomId, RoomState, RoomStateView, RoomSummary, RoomView, RoundRecord, ServerStats,
};
