//! The room registry: every live room, plus the reverse player-to-room
//! index that enforces one room per player.
//!
//! The registry owns only bookkeeping; room state lives behind each
//! [`RoomHandle`]. Callers serialize access (the gateway keeps the
//! registry behind a mutex), so the maps themselves are plain.

use std::collections::HashMap;

use durbar_game::{GameConfig, REQUIRED_PLAYERS};
use durbar_protocol::{PlayerId, RoomFilter, RoomId, RoomState, RoomSummary, RoomView, ServerStats};
use tracing::{info, warn};

use crate::actor::{EventSender, RoomHandle};
use crate::config::RegistryConfig;
use crate::error::RoomError;
use crate::password::PasswordHash;
use crate::player::Player;

/// Attempts at a fresh room code before giving up. With a 32^6 code space
/// and at most `max_rooms` live rooms, one attempt almost always suffices.
const ID_ATTEMPTS: usize = 16;

pub struct Registry {
    config: RegistryConfig,
    game_config: GameConfig,
    rooms: HashMap<RoomId, RoomHandle>,
    player_rooms: HashMap<PlayerId, RoomId>,
}

impl Registry {
    pub fn new(config: RegistryConfig, game_config: GameConfig) -> Self {
        Self {
            config,
            game_config,
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
        }
    }

    // -- Creation -----------------------------------------------------------

    /// Creates a room with `creator` seated and returns its first view.
    pub async fn create_room(
        &mut self,
        creator: Player,
        sender: EventSender,
        password: Option<String>,
        max_players: usize,
    ) -> Result<RoomView, RoomError> {
        if self.player_rooms.contains_key(&creator.id) {
            return Err(RoomError::AlreadyInRoom(creator.id));
        }
        if self.rooms.len() >= self.config.max_rooms {
            return Err(RoomError::ServerFull);
        }
        // The game needs exactly four seats; any other size could never start.
        if max_players != REQUIRED_PLAYERS {
            return Err(RoomError::InvalidMaxPlayers(max_players));
        }

        let id = self.fresh_id()?;
        let hash = password.as_deref().map(PasswordHash::new);
        let creator_id = creator.id;
        let handle = RoomHandle::spawn(
            id.clone(),
            creator,
            sender,
            hash,
            max_players,
            self.game_config.clone(),
        );
        let view = handle.view().await?;
        info!(room_id = %id, creator = %creator_id, "room created");
        self.rooms.insert(id.clone(), handle);
        self.player_rooms.insert(creator_id, id);
        Ok(view)
    }

    fn fresh_id(&self) -> Result<RoomId, RoomError> {
        let mut rng = rand::rng();
        for _ in 0..ID_ATTEMPTS {
            let id = RoomId::generate(&mut rng);
            if !self.rooms.contains_key(&id) {
                return Ok(id);
            }
        }
        warn!("exhausted room code attempts");
        Err(RoomError::ServerFull)
    }

    // -- Membership ---------------------------------------------------------

    /// Seats `player` in the room with `id`.
    pub async fn join_room(
        &mut self,
        id: &RoomId,
        player: Player,
        password: Option<String>,
        sender: EventSender,
    ) -> Result<RoomView, RoomError> {
        if let Some(current) = self.player_rooms.get(&player.id) {
            return Err(if current == id {
                RoomError::AlreadyInThisRoom(player.id)
            } else {
                RoomError::AlreadyInRoom(player.id)
            });
        }
        let handle = self
            .rooms
            .get(id)
            .ok_or_else(|| RoomError::NotFound(id.clone()))?;

        let player_id = player.id;
        let view = handle.join(player, password, sender).await?;
        self.player_rooms.insert(player_id, id.clone());
        Ok(view)
    }

    /// Removes `player` from their room. Returns the id of the room they
    /// left and whether the room was deleted because it emptied.
    pub async fn leave(&mut self, player: PlayerId) -> Result<(RoomId, bool), RoomError> {
        let Some(id) = self.player_rooms.remove(&player) else {
            return Err(RoomError::NotInAnyRoom(player));
        };
        let Some(handle) = self.rooms.get(&id) else {
            // Reverse index pointed at a swept room.
            return Err(RoomError::NotFound(id));
        };

        let outcome = handle.leave(player).await?;
        if outcome.now_empty {
            self.rooms.remove(&id);
            info!(room_id = %id, "room emptied and deleted");
        }
        Ok((id, outcome.now_empty))
    }

    /// The room a player currently occupies.
    pub fn room_of(&self, player: PlayerId) -> Option<&RoomHandle> {
        self.player_rooms
            .get(&player)
            .and_then(|id| self.rooms.get(id))
    }

    pub fn get(&self, id: &RoomId) -> Option<&RoomHandle> {
        self.rooms.get(id)
    }

    // -- Listing and stats --------------------------------------------------

    pub async fn list_rooms(&self, filter: RoomFilter) -> Vec<RoomSummary> {
        let mut summaries = Vec::with_capacity(self.rooms.len());
        for handle in self.rooms.values() {
            // A room mid-shutdown just drops out of the listing.
            let Ok(view) = handle.view().await else { continue };
            if filter.joinable_only
                && !(view.state.is_joinable() && view.player_count < view.max_players)
            {
                continue;
            }
            summaries.push(RoomSummary {
                room_id: view.room_id,
                player_count: view.player_count,
                max_players: view.max_players,
                state: view.state,
                has_password: view.has_password,
            });
        }
        summaries.sort_by(|a, b| a.room_id.as_str().cmp(b.room_id.as_str()));
        summaries
    }

    /// Registry-level counters. Uptime is filled in by the caller.
    pub async fn stats(&self) -> ServerStats {
        let mut stats = ServerStats {
            rooms: self.rooms.len(),
            players: self.player_rooms.len(),
            rooms_waiting: 0,
            rooms_playing: 0,
            rooms_finished: 0,
            uptime_ms: 0,
        };
        for handle in self.rooms.values() {
            let Ok(health) = handle.health().await else { continue };
            match health.state {
                RoomState::Waiting => stats.rooms_waiting += 1,
                RoomState::Playing => stats.rooms_playing += 1,
                RoomState::Finished => stats.rooms_finished += 1,
            }
        }
        stats
    }

    // -- Housekeeping -------------------------------------------------------

    /// Deletes rooms idle past the configured threshold. Returns the ids
    /// of deleted rooms so the caller can notify the lobby.
    pub async fn sweep_stale(&mut self) -> Vec<RoomId> {
        let mut stale = Vec::new();
        for (id, handle) in &self.rooms {
            match handle.health().await {
                Ok(health) if health.idle >= self.config.stale_after => {
                    stale.push(id.clone());
                }
                Ok(_) => {}
                // Actor already gone; reap the entry.
                Err(_) => stale.push(id.clone()),
            }
        }
        for id in &stale {
            if let Some(handle) = self.rooms.remove(id) {
                handle.shutdown().await;
            }
            self.player_rooms.retain(|_, room| room != id);
            warn!(room_id = %id, "stale room swept");
        }
        stale
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        self.config.sweep_interval
    }
}
