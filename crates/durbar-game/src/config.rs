//! Game pacing configuration.

/// Timing and length parameters for one game.
///
/// The defaults are the live values; tests shorten them to keep paused-time
/// runs readable.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Number of deal-guess-score rounds in a full game.
    pub max_rounds: u32,

    /// Countdown before the first deal, in seconds.
    pub start_countdown_secs: u32,

    /// Countdown between rounds, in seconds.
    pub next_round_countdown_secs: u32,

    /// Deadline for the Mantri's guess each round, in seconds.
    pub round_secs: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            start_countdown_secs: 5,
            next_round_countdown_secs: 5,
            round_secs: 30,
        }
    }
}

/// Number of seats a game needs, one per role card.
pub const REQUIRED_PLAYERS: usize = 4;
