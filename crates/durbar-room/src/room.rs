//! The room value object: membership, capacity, password, and views.
//!
//! `Room` is plain data mutated only by its owning actor, so none of this
//! needs locking. Game phase lives in the session; the room only learns
//! its coarse state when a view is produced.

use std::time::Duration;

use tokio::time::Instant;

use durbar_protocol::{PlayerId, PlayerView, RoomId, RoomState, RoomSummary, RoomView};

use crate::error::RoomError;
use crate::password::PasswordHash;
use crate::player::{Player, epoch_ms};

/// What `remove_player` observed, so the actor can react.
#[derive(Debug)]
pub struct Departure {
    pub player: Player,
    pub was_creator: bool,
    /// Set when creatorship moved to the earliest-joined survivor.
    pub new_creator: Option<PlayerId>,
    pub now_empty: bool,
}

#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    players: Vec<Player>,
    max_players: usize,
    password: Option<PasswordHash>,
    created_at: u64,
    last_activity: Instant,
}

impl Room {
    pub fn new(
        id: RoomId,
        creator: Player,
        password: Option<PasswordHash>,
        max_players: usize,
    ) -> Self {
        Self {
            id,
            players: vec![creator],
            max_players,
            password,
            created_at: epoch_ms(),
            last_activity: Instant::now(),
        }
    }

    // -- Membership ---------------------------------------------------------

    /// Seats a new player. The caller has already verified the room is in
    /// a joinable state.
    pub fn add_player(&mut self, player: Player, password: Option<&str>) -> Result<(), RoomError> {
        self.check_password(password)?;
        if self.players.len() >= self.max_players {
            return Err(RoomError::RoomFull);
        }
        if self
            .players
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(&player.name))
        {
            return Err(RoomError::DuplicateName(player.name));
        }
        self.players.push(player);
        Ok(())
    }

    /// Unseats a player, promoting a new creator if the creator left.
    /// Join order decides the succession.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Departure> {
        let index = self.players.iter().position(|p| p.id == id)?;
        let player = self.players.remove(index);

        let mut new_creator = None;
        if player.is_creator {
            if let Some(heir) = self.players.first_mut() {
                heir.is_creator = true;
                new_creator = Some(heir.id);
            }
        }
        Some(Departure {
            was_creator: player.is_creator,
            player,
            new_creator,
            now_empty: self.players.is_empty(),
        })
    }

    fn check_password(&self, attempt: Option<&str>) -> Result<(), RoomError> {
        match (&self.password, attempt) {
            (None, _) => Ok(()),
            (Some(hash), Some(attempt)) if hash.verify(attempt) => Ok(()),
            (Some(_), _) => Err(RoomError::WrongPassword),
        }
    }

    // -- Accessors ----------------------------------------------------------

    pub fn is_member(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    pub fn is_creator(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id && p.is_creator)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    pub fn player_views(&self) -> Vec<PlayerView> {
        self.players.iter().map(Player::to_view).collect()
    }

    pub fn find(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Bumps every member's games-played counter after a completed game.
    pub fn record_game_played(&mut self) {
        for player in &mut self.players {
            player.games_played += 1;
        }
    }

    // -- Activity -----------------------------------------------------------

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle(&self) -> Duration {
        self.last_activity.elapsed()
    }

    // -- Views --------------------------------------------------------------

    pub fn public_view(&self, state: RoomState) -> RoomView {
        RoomView {
            room_id: self.id.clone(),
            players: self.player_views(),
            player_count: self.players.len(),
            max_players: self.max_players,
            state,
            has_password: self.password.is_some(),
            created_at: self.created_at,
        }
    }

    pub fn summary(&self, state: RoomState) -> RoomSummary {
        RoomSummary {
            room_id: self.id.clone(),
            player_count: self.players.len(),
            max_players: self.max_players,
            state,
            has_password: self.password.is_some(),
        }
    }
}
