//! The intent gateway: the single entry point a transport layer talks to.
//!
//! A transport (whatever it is) registers one connection per player, then
//! feeds decoded [`ClientIntent`]s into [`Gateway::handle_intent`] and
//! ships the returned [`Ack`] back on the same connection. Pushed
//! [`ServerEvent`]s arrive on the event channel registered at connect
//! time. The gateway owns the registry, the connection table, and the
//! housekeeping sweep; per-room state stays behind the room actors.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use durbar_game::GameConfig;
use durbar_protocol::{Ack, ClientIntent, PlayerId, RoomFilter, ServerEvent};
use durbar_room::{EventSender, Player, Registry, RegistryConfig, RoomError, validate_name};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::DurbarError;

struct Connection {
    name: String,
    sender: EventSender,
}

pub struct Gateway {
    registry: Mutex<Registry>,
    connections: Mutex<HashMap<PlayerId, Connection>>,
    started: Instant,
}

impl Gateway {
    pub fn new(config: RegistryConfig, game_config: GameConfig) -> Arc<Self> {
        Arc::new(Self {
            registry: Mutex::new(Registry::new(config, game_config)),
            connections: Mutex::new(HashMap::new()),
            started: Instant::now(),
        })
    }

    // -- Connections --------------------------------------------------------

    /// Registers a player's connection. The display name is validated
    /// here, once, and reused for every room they enter.
    pub async fn connect(
        &self,
        player_id: PlayerId,
        name: &str,
        sender: EventSender,
    ) -> Result<(), DurbarError> {
        let name = validate_name(name)?;
        info!(player_id = %player_id, name = %name, "player connected");
        self.connections
            .lock()
            .await
            .insert(player_id, Connection { name, sender });
        Ok(())
    }

    /// Unregisters a connection, leaving any room the player occupied.
    pub async fn disconnect(&self, player_id: PlayerId) {
        self.connections.lock().await.remove(&player_id);
        let left = {
            let mut registry = self.registry.lock().await;
            registry.leave(player_id).await
        };
        match left {
            Ok((room_id, deleted)) => {
                info!(player_id = %player_id, room_id = %room_id, "player disconnected");
                if deleted {
                    self.broadcast(ServerEvent::RoomDeleted { room_id }).await;
                }
                self.broadcast_room_list().await;
            }
            Err(_) => {
                debug!(player_id = %player_id, "player disconnected outside any room");
            }
        }
    }

    // -- Intents ------------------------------------------------------------

    /// Processes one intent and produces its acknowledgement. Never
    /// returns an error: failures become `{ success: false }` acks.
    pub async fn handle_intent(&self, player_id: PlayerId, intent: ClientIntent) -> Ack {
        match self.dispatch(player_id, intent).await {
            Ok(ack) => ack,
            Err(err) => {
                debug!(player_id = %player_id, kind = %err.kind(), error = %err, "intent failed");
                fail(&err)
            }
        }
    }

    async fn dispatch(
        &self,
        player_id: PlayerId,
        intent: ClientIntent,
    ) -> Result<Ack, DurbarError> {
        match intent {
            ClientIntent::CreateRoom {
                password,
                max_players,
            } => {
                let (name, sender) = self.connection(player_id).await?;
                let creator = Player::new(player_id, &name, true)?;
                let view = {
                    let mut registry = self.registry.lock().await;
                    registry
                        .create_room(creator, sender, password, max_players)
                        .await?
                };
                self.broadcast_room_list().await;
                Ok(Ack::with(serde_json::json!({ "room": view })))
            }

            ClientIntent::JoinRoom { room_id, password } => {
                let (name, sender) = self.connection(player_id).await?;
                let member = Player::new(player_id, &name, false)?;
                let view = {
                    let mut registry = self.registry.lock().await;
                    registry.join_room(&room_id, member, password, sender).await?
                };
                self.broadcast_room_list().await;
                Ok(Ack::with(serde_json::json!({ "room": view })))
            }

            ClientIntent::LeaveRoom => {
                self.connection(player_id).await?;
                let (room_id, deleted) = {
                    let mut registry = self.registry.lock().await;
                    registry.leave(player_id).await?
                };
                if deleted {
                    self.broadcast(ServerEvent::RoomDeleted { room_id }).await;
                }
                self.broadcast_room_list().await;
                Ok(Ack::ok())
            }

            ClientIntent::GetRooms { filters } => {
                let rooms = self.registry.lock().await.list_rooms(filters).await;
                Ok(Ack::with(serde_json::json!({ "rooms": rooms })))
            }

            ClientIntent::GetRoomState => {
                let state = self.room_of(player_id).await?.state().await?;
                Ok(Ack::with(serde_json::json!({ "state": state })))
            }

            ClientIntent::StartGame => {
                self.room_of(player_id).await?.start_game(player_id).await?;
                Ok(Ack::ok())
            }

            ClientIntent::MakeGuess { guessed_player_id } => {
                self.room_of(player_id)
                    .await?
                    .guess(player_id, guessed_player_id)
                    .await?;
                Ok(Ack::ok())
            }

            ClientIntent::NextRound => {
                self.room_of(player_id).await?.next_round(player_id).await?;
                Ok(Ack::ok())
            }

            ClientIntent::PlayAgainResponse { accepted } => {
                self.room_of(player_id)
                    .await?
                    .play_again(player_id, accepted)
                    .await?;
                Ok(Ack::ok())
            }

            ClientIntent::GetResults => {
                let results = self.room_of(player_id).await?.results().await?;
                Ok(Ack::with(serde_json::json!({ "results": results })))
            }

            ClientIntent::GetServerStats => {
                let mut stats = self.registry.lock().await.stats().await;
                stats.uptime_ms = self.started.elapsed().as_millis() as u64;
                Ok(Ack::with(serde_json::json!({ "stats": stats })))
            }
        }
    }

    // -- Housekeeping -------------------------------------------------------

    /// Spawns the periodic stale-room sweep. The task runs until the
    /// gateway is dropped by its last holder.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let gateway = Arc::clone(self);
        tokio::spawn(async move {
            let period = gateway.registry.lock().await.sweep_interval();
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let swept = {
                    let mut registry = gateway.registry.lock().await;
                    registry.sweep_stale().await
                };
                if swept.is_empty() {
                    continue;
                }
                info!(count = swept.len(), "swept stale rooms");
                for room_id in swept {
                    gateway.broadcast(ServerEvent::RoomDeleted { room_id }).await;
                }
                gateway.broadcast_room_list().await;
            }
        })
    }

    // -- Helpers ------------------------------------------------------------

    async fn connection(&self, player_id: PlayerId) -> Result<(String, EventSender), DurbarError> {
        let connections = self.connections.lock().await;
        let conn = connections
            .get(&player_id)
            .ok_or(DurbarError::NotConnected)?;
        Ok((conn.name.clone(), conn.sender.clone()))
    }

    async fn room_of(&self, player_id: PlayerId) -> Result<durbar_room::RoomHandle, DurbarError> {
        self.connection(player_id).await?;
        let registry = self.registry.lock().await;
        registry
            .room_of(player_id)
            .cloned()
            .ok_or_else(|| DurbarError::Room(RoomError::NotInAnyRoom(player_id)))
    }

    /// Pushes an event to every registered connection.
    async fn broadcast(&self, event: ServerEvent) {
        let connections = self.connections.lock().await;
        for conn in connections.values() {
            let _ = conn.sender.send(event.clone());
        }
    }

    async fn broadcast_room_list(&self) {
        let rooms = {
            let registry = self.registry.lock().await;
            registry.list_rooms(RoomFilter::default()).await
        };
        self.broadcast(ServerEvent::RoomListUpdated { rooms }).await;
    }
}

/// Failure ack carrying the message and its classification.
fn fail(err: &DurbarError) -> Ack {
    let mut ack = Ack::fail(err.to_string());
    if let serde_json::Value::Object(map) = &mut ack.data {
        map.insert(
            "kind".into(),
            serde_json::Value::String(err.kind().to_string()),
        );
    }
    ack
}
