//! Dealing: assigning the four role cards to the four seated players.

use std::collections::HashMap;

use durbar_protocol::{PlayerId, Role};
use rand::Rng;
use rand::seq::SliceRandom;

/// Deals one card to each player via an unbiased Fisher-Yates shuffle.
///
/// The result is a bijection: four distinct players, four distinct roles,
/// uniform over all 24 permutations. Re-executed from scratch every round.
pub fn assign_roles(players: &[PlayerId], rng: &mut impl Rng) -> HashMap<PlayerId, Role> {
    debug_assert_eq!(players.len(), Role::ALL.len());
    let mut roles = Role::ALL;
    roles.shuffle(rng);
    players.iter().copied().zip(roles).collect()
}

/// Finds the player holding `role` in a deal.
pub fn holder_of(cards: &HashMap<PlayerId, Role>, role: Role) -> Option<PlayerId> {
    cards
        .iter()
        .find(|(_, r)| **r == role)
        .map(|(id, _)| *id)
}
