//! One actor task per room.
//!
//! All mutation of a room and its game session happens inside the actor's
//! command loop, so intents and timer expiries are serialized without
//! locks. Timers deliver [`RoomCommand::Timer`] messages back into the
//! same channel, stamped with the generation current when they were
//! started; the actor drops messages from superseded generations, which
//! is what resolves the guess-versus-deadline race in favour of whichever
//! reached the channel first.

use std::collections::HashMap;

use durbar_game::{CountdownKind, Effects, GameConfig, GameSession, TimerCmd};
use durbar_protocol::{
    GameResults, PlayerId, Recipient, RoomId, RoomStateView, RoomView, ServerEvent,
};
use durbar_timer::{TimerEvent, TimerHandle};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::RoomError;
use crate::password::PasswordHash;
use crate::player::Player;
use crate::room::Room;

/// Per-player outbound event channel, registered at join time.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

const COMMAND_BUFFER: usize = 64;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// What the registry (and the room's own timers) can ask of a room.
#[derive(Debug)]
pub enum RoomCommand {
    Join {
        player: Player,
        password: Option<String>,
        sender: EventSender,
        reply: oneshot::Sender<Result<RoomView, RoomError>>,
    },
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<LeaveOutcome, RoomError>>,
    },
    StartGame {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Guess {
        player_id: PlayerId,
        target: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    NextRound {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    PlayAgain {
        player_id: PlayerId,
        accepted: bool,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    GetView {
        reply: oneshot::Sender<RoomView>,
    },
    GetState {
        reply: oneshot::Sender<RoomStateView>,
    },
    GetResults {
        reply: oneshot::Sender<Result<GameResults, RoomError>>,
    },
    GetHealth {
        reply: oneshot::Sender<RoomHealth>,
    },
    /// Delivered by the room's own timer task.
    Timer {
        generation: u64,
        kind: CountdownKind,
        event: TimerEvent,
    },
    Shutdown,
}

/// What happened when a player left, for registry bookkeeping.
#[derive(Debug)]
pub struct LeaveOutcome {
    pub room_id: RoomId,
    pub was_creator: bool,
    pub now_empty: bool,
}

/// Liveness snapshot for the housekeeping sweep and server stats.
#[derive(Debug, Clone)]
pub struct RoomHealth {
    pub players: usize,
    pub state: durbar_protocol::RoomState,
    pub idle: std::time::Duration,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable handle to a room actor. All methods are request/reply over
/// the command channel; [`RoomError::Unavailable`] means the actor is gone.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    id: RoomId,
    tx: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Spawns a room actor with its creator already seated.
    pub fn spawn(
        id: RoomId,
        creator: Player,
        sender: EventSender,
        password: Option<PasswordHash>,
        max_players: usize,
        config: GameConfig,
    ) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let actor = RoomActor::new(id.clone(), creator, sender, password, max_players, config, tx.clone());
        tokio::spawn(actor.run(rx));
        Self { id, tx }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| RoomError::Unavailable)?;
        rx.await.map_err(|_| RoomError::Unavailable)
    }

    pub async fn join(
        &self,
        player: Player,
        password: Option<String>,
        sender: EventSender,
    ) -> Result<RoomView, RoomError> {
        self.request(|reply| RoomCommand::Join {
            player,
            password,
            sender,
            reply,
        })
        .await?
    }

    pub async fn leave(&self, player_id: PlayerId) -> Result<LeaveOutcome, RoomError> {
        self.request(|reply| RoomCommand::Leave { player_id, reply }).await?
    }

    pub async fn start_game(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::StartGame { player_id, reply }).await?
    }

    pub async fn guess(&self, player_id: PlayerId, target: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Guess {
            player_id,
            target,
            reply,
        })
        .await?
    }

    pub async fn next_round(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::NextRound { player_id, reply }).await?
    }

    pub async fn play_again(&self, player_id: PlayerId, accepted: bool) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::PlayAgain {
            player_id,
            accepted,
            reply,
        })
        .await?
    }

    pub async fn view(&self) -> Result<RoomView, RoomError> {
        self.request(|reply| RoomCommand::GetView { reply }).await
    }

    pub async fn state(&self) -> Result<RoomStateView, RoomError> {
        self.request(|reply| RoomCommand::GetState { reply }).await
    }

    pub async fn results(&self) -> Result<GameResults, RoomError> {
        self.request(|reply| RoomCommand::GetResults { reply }).await?
    }

    pub async fn health(&self) -> Result<RoomHealth, RoomError> {
        self.request(|reply| RoomCommand::GetHealth { reply }).await
    }

    /// Asks the actor to stop. Pending commands already queued still run.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(RoomCommand::Shutdown).await;
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct RoomActor {
    room: Room,
    session: GameSession,
    senders: HashMap<PlayerId, EventSender>,
    timer: Option<TimerHandle>,
    /// Bumped whenever a timer is replaced; stale deliveries are dropped.
    timer_generation: u64,
    self_tx: mpsc::Sender<RoomCommand>,
}

impl RoomActor {
    fn new(
        id: RoomId,
        creator: Player,
        sender: EventSender,
        password: Option<PasswordHash>,
        max_players: usize,
        config: GameConfig,
        self_tx: mpsc::Sender<RoomCommand>,
    ) -> Self {
        let creator_id = creator.id;
        let room = Room::new(id, creator, password, max_players);
        let mut senders = HashMap::new();
        senders.insert(creator_id, sender);
        Self {
            room,
            session: GameSession::new(config),
            senders,
            timer: None,
            timer_generation: 0,
            self_tx,
        }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<RoomCommand>) {
        info!(room_id = %self.room.id, "room actor started");
        while let Some(command) = rx.recv().await {
            if self.handle(command) {
                break;
            }
        }
        self.cancel_timer();
        info!(room_id = %self.room.id, "room actor stopped");
    }

    /// Returns `true` when the actor should stop.
    fn handle(&mut self, command: RoomCommand) -> bool {
        if !matches!(&command, RoomCommand::Timer { .. } | RoomCommand::GetHealth { .. }) {
            self.room.touch();
        }
        match command {
            RoomCommand::Join {
                player,
                password,
                sender,
                reply,
            } => {
                let _ = reply.send(self.join(player, password, sender));
            }
            RoomCommand::Leave { player_id, reply } => {
                let outcome = self.leave(player_id);
                let empty = matches!(&outcome, Ok(o) if o.now_empty);
                let _ = reply.send(outcome);
                if empty {
                    return true;
                }
            }
            RoomCommand::StartGame { player_id, reply } => {
                let _ = reply.send(self.start_game(player_id));
            }
            RoomCommand::Guess {
                player_id,
                target,
                reply,
            } => {
                let result = self
                    .session
                    .make_guess(player_id, target)
                    .map(|fx| self.apply(fx))
                    .map_err(RoomError::from);
                let _ = reply.send(result);
            }
            RoomCommand::NextRound { player_id, reply } => {
                let _ = reply.send(self.next_round(player_id));
            }
            RoomCommand::PlayAgain {
                player_id,
                accepted,
                reply,
            } => {
                let members = self.room.player_ids();
                let result = self
                    .session
                    .play_again(player_id, accepted, &members)
                    .map(|fx| self.apply(fx))
                    .map_err(RoomError::from);
                let _ = reply.send(result);
            }
            RoomCommand::GetView { reply } => {
                let _ = reply.send(self.view());
            }
            RoomCommand::GetState { reply } => {
                let _ = reply.send(self.session.state_view(self.view()));
            }
            RoomCommand::GetResults { reply } => {
                let _ = reply.send(self.session.results().map_err(RoomError::from));
            }
            RoomCommand::GetHealth { reply } => {
                let _ = reply.send(RoomHealth {
                    players: self.room.player_count(),
                    state: self.session.phase().room_state(),
                    idle: self.room.idle(),
                });
            }
            RoomCommand::Timer {
                generation,
                kind,
                event,
            } => self.timer_message(generation, kind, event),
            RoomCommand::Shutdown => return true,
        }
        false
    }

    // -- Membership ---------------------------------------------------------

    fn join(
        &mut self,
        player: Player,
        password: Option<String>,
        sender: EventSender,
    ) -> Result<RoomView, RoomError> {
        if !self.session.phase().room_state().is_joinable() {
            return Err(RoomError::NotJoinable);
        }
        let id = player.id;
        let view_of_joiner = player.to_view();
        self.room.add_player(player, password.as_deref())?;
        self.senders.insert(id, sender);

        let view = self.view();
        info!(room_id = %self.room.id, player_id = %id, "player joined");
        // The joiner learns the room from their ack; the rest get the event.
        self.send(
            Recipient::AllExcept(id),
            ServerEvent::PlayerJoined {
                player: view_of_joiner,
                room: view.clone(),
            },
        );
        Ok(view)
    }

    fn leave(&mut self, player_id: PlayerId) -> Result<LeaveOutcome, RoomError> {
        let Some(departure) = self.room.remove_player(player_id) else {
            return Err(RoomError::NotInAnyRoom(player_id));
        };
        self.senders.remove(&player_id);
        info!(
            room_id = %self.room.id,
            player_id = %player_id,
            name = %departure.player.name,
            was_creator = departure.was_creator,
            "player left"
        );

        if !departure.now_empty {
            let view = self.view();
            self.send(
                Recipient::All,
                ServerEvent::PlayerLeft {
                    player_id,
                    room: view,
                    was_creator: departure.was_creator,
                },
            );
            // A live game cannot continue with an empty seat.
            if self.session.phase().is_active() {
                warn!(room_id = %self.room.id, "seat vacated mid-game, ending");
                let fx = self.session.force_end("a player left the game");
                self.apply(fx);
            }
        }
        Ok(LeaveOutcome {
            room_id: self.room.id.clone(),
            was_creator: departure.was_creator,
            now_empty: departure.now_empty,
        })
    }

    // -- Game intents -------------------------------------------------------

    fn start_game(&mut self, player_id: PlayerId) -> Result<(), RoomError> {
        if !self.room.is_creator(player_id) {
            return Err(RoomError::NotCreator(player_id));
        }
        let fx = self.session.start(self.room.player_views())?;
        self.apply(fx);
        Ok(())
    }

    fn next_round(&mut self, player_id: PlayerId) -> Result<(), RoomError> {
        if !self.room.is_creator(player_id) {
            return Err(RoomError::NotCreator(player_id));
        }
        let fx = self.session.skip_countdown(&mut rand::rng())?;
        self.apply(fx);
        Ok(())
    }

    // -- Timers -------------------------------------------------------------

    fn timer_message(&mut self, generation: u64, kind: CountdownKind, event: TimerEvent) {
        if generation != self.timer_generation {
            debug!(
                room_id = %self.room.id,
                generation,
                current = self.timer_generation,
                "dropping stale timer message"
            );
            return;
        }
        match event {
            TimerEvent::Tick { remaining } => {
                if let Some(event) = self.session.tick_event(kind, remaining) {
                    self.send(Recipient::All, event);
                }
            }
            TimerEvent::Elapsed => {
                let fx = self.session.countdown_elapsed(kind, &mut rand::rng());
                self.apply(fx);
            }
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.timer_generation += 1;
    }

    fn start_countdown(&mut self, kind: CountdownKind, secs: u32) {
        self.cancel_timer();
        let generation = self.timer_generation;
        let tx = self.self_tx.clone();
        self.timer = Some(durbar_timer::countdown(secs, tx, move |event| {
            RoomCommand::Timer {
                generation,
                kind,
                event,
            }
        }));
    }

    // -- Effects ------------------------------------------------------------

    fn apply(&mut self, fx: Effects) {
        match fx.timer {
            TimerCmd::None => {}
            TimerCmd::CancelAll => self.cancel_timer(),
            TimerCmd::Countdown { kind, secs } => self.start_countdown(kind, secs),
        }
        for (recipient, event) in fx.events {
            self.send(recipient, event);
        }
        if fx.reset {
            self.room.record_game_played();
            self.send(
                Recipient::All,
                ServerEvent::GameReset {
                    players: self.room.player_views(),
                },
            );
        }
    }

    fn send(&self, recipient: Recipient, event: ServerEvent) {
        match recipient {
            Recipient::All => {
                for sender in self.senders.values() {
                    let _ = sender.send(event.clone());
                }
            }
            Recipient::Player(id) => {
                if let Some(sender) = self.senders.get(&id) {
                    let _ = sender.send(event);
                }
            }
            Recipient::AllExcept(excluded) => {
                for (id, sender) in &self.senders {
                    if *id != excluded {
                        let _ = sender.send(event.clone());
                    }
                }
            }
        }
    }

    fn view(&self) -> RoomView {
        self.room.public_view(self.session.phase().room_state())
    }
}
