//! Raja-Mantri-Chor-Sipahi game rules: dealing, guessing, scoring, and the
//! per-room phase machine that ties them to countdown timers.
//!
//! This crate is deliberately runtime-free. [`GameSession`] is a plain
//! state machine; the room actor in `durbar-room` owns one per room, feeds
//! it intents and timer expiries, and executes the [`Effects`] it returns.

mod config;
mod deal;
mod error;
mod score;
mod session;

pub use config::{GameConfig, REQUIRED_PLAYERS};
pub use deal::{assign_roles, holder_of};
pub use error::GameError;
pub use score::{
    CHOR_UNCAUGHT_SCORE, MANTRI_CORRECT_SCORE, RAJA_SCORE, ROUND_TOTAL, SIPAHI_SCORE, role_score,
    round_scores,
};
pub use session::{CountdownKind, Effects, GameSession, TimerCmd};
