//! Round scoring: a pure function of the deal and the guess outcome.

use std::collections::HashMap;

use durbar_protocol::{PlayerId, Role};

/// Raja scores this every round, regardless of the guess.
pub const RAJA_SCORE: u32 = 1000;
/// Sipahi scores this every round, regardless of the guess.
pub const SIPAHI_SCORE: u32 = 500;
/// Mantri scores this on a correct guess, zero otherwise.
pub const MANTRI_CORRECT_SCORE: u32 = 800;
/// Chor scores this when NOT caught, zero when caught.
pub const CHOR_UNCAUGHT_SCORE: u32 = 800;

/// Sum handed out each round. Always 1000 + 500 + 800 = 2300: exactly one
/// of Mantri/Chor collects the 800 depending on the guess.
pub const ROUND_TOTAL: u32 = RAJA_SCORE + SIPAHI_SCORE + MANTRI_CORRECT_SCORE;

/// Score for one role given whether the Mantri guessed correctly.
pub fn role_score(role: Role, correct: bool) -> u32 {
    match role {
        Role::Raja => RAJA_SCORE,
        Role::Sipahi => SIPAHI_SCORE,
        Role::Mantri => {
            if correct {
                MANTRI_CORRECT_SCORE
            } else {
                0
            }
        }
        Role::Chor => {
            if correct {
                0
            } else {
                CHOR_UNCAUGHT_SCORE
            }
        }
    }
}

/// Scores one round for every seated player.
pub fn round_scores(cards: &HashMap<PlayerId, Role>, correct: bool) -> HashMap<PlayerId, u32> {
    cards
        .iter()
        .map(|(id, role)| (*id, role_score(*role, correct)))
        .collect()
}
