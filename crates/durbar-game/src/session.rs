//! The per-room game session: a phase machine advanced by intents and
//! timer expiries.
//!
//! Every method is a synchronous state transition returning [`Effects`],
//! a description of what the caller (the room actor) should do next:
//! which events to fan out, what to do with the room's timer, and whether
//! the roster needs a post-game reset. The session itself never spawns
//! tasks, never sends on channels, and never touches a clock beyond
//! recording start/end instants, so the whole game loop is testable
//! without a runtime.
//!
//! Phase graph:
//!
//! ```text
//! Waiting -> CountingDown -> Playing -> RoundResolving -+-> RoundCountdown
//!    ^                          ^                       |        |
//!    |                          +-----------------------+--------+
//!    +--- reset (all accepted play-again) --- Finished <+
//! ```

use std::collections::HashMap;
use std::time::Instant;

use durbar_protocol::{
    GamePhase, GameResults, PlayerId, PlayerView, RankedPlayer, Recipient, Role, RoomStateView,
    RoomView, RoundRecord, ServerEvent,
};
use rand::Rng;

use crate::config::{GameConfig, REQUIRED_PLAYERS};
use crate::deal::{assign_roles, holder_of};
use crate::error::GameError;
use crate::score::round_scores;

// ---------------------------------------------------------------------------
// Effects: what the room actor must do after a transition
// ---------------------------------------------------------------------------

/// Which countdown a timer command refers to.
///
/// The kind travels inside timer messages so that, combined with the
/// generation number, a late expiry from a superseded phase is recognised
/// and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownKind {
    /// The pre-game countdown after `startGame`.
    GameStart,
    /// The pause between a resolved round and the next deal.
    NextRound,
    /// The per-round guess deadline.
    Round,
}

/// Timer instruction attached to a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCmd {
    /// Leave the current timer running.
    None,
    /// Cancel whatever timer is running and start nothing.
    CancelAll,
    /// Cancel the current timer and start a fresh countdown.
    Countdown { kind: CountdownKind, secs: u32 },
}

/// The outcome of one state transition.
#[derive(Debug)]
pub struct Effects {
    /// Events to deliver, in order.
    pub events: Vec<(Recipient, ServerEvent)>,
    /// What to do with the room's timer.
    pub timer: TimerCmd,
    /// Set when a unanimous play-again vote reset the session. The actor
    /// bumps each member's games-played counter and broadcasts the reset.
    pub reset: bool,
}

impl Effects {
    fn none() -> Self {
        Self {
            events: Vec::new(),
            timer: TimerCmd::None,
            reset: false,
        }
    }

    fn broadcast(mut self, event: ServerEvent) -> Self {
        self.events.push((Recipient::All, event));
        self
    }

    fn to(mut self, player: PlayerId, event: ServerEvent) -> Self {
        self.events.push((Recipient::Player(player), event));
        self
    }

    fn timer(mut self, timer: TimerCmd) -> Self {
        self.timer = timer;
        self
    }
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

/// State for one game within a room, from `startGame` to reset.
#[derive(Debug)]
pub struct GameSession {
    config: GameConfig,
    phase: GamePhase,
    /// 1-based; 0 before the first deal.
    current_round: u32,
    /// Seats locked in at `startGame`, in join order.
    roster: Vec<PlayerView>,
    /// The current round's deal. Cleared between games, replaced each round.
    cards: HashMap<PlayerId, Role>,
    mantri_id: Option<PlayerId>,
    chor_id: Option<PlayerId>,
    total_scores: HashMap<PlayerId, u32>,
    round_history: Vec<RoundRecord>,
    /// Play-again votes keyed by player; a player may change their vote.
    play_again: HashMap<PlayerId, bool>,
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
}

impl GameSession {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            phase: GamePhase::Waiting,
            current_round: 0,
            roster: Vec::new(),
            cards: HashMap::new(),
            mantri_id: None,
            chor_id: None,
            total_scores: HashMap::new(),
            round_history: Vec::new(),
            play_again: HashMap::new(),
            started_at: None,
            ended_at: None,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    /// Snapshot for `getRoomState`. Hidden cards stay hidden; only the
    /// Mantri's identity is public once a round has been dealt.
    pub fn state_view(&self, room: RoomView) -> RoomStateView {
        RoomStateView {
            room,
            phase: self.phase,
            current_round: self.current_round,
            max_rounds: self.config.max_rounds,
            total_scores: self.total_scores.clone(),
            mantri_id: self.mantri_id,
        }
    }

    // -- startGame ----------------------------------------------------------

    /// Locks in the roster and starts the pre-game countdown.
    pub fn start(&mut self, members: Vec<PlayerView>) -> Result<Effects, GameError> {
        if self.phase != GamePhase::Waiting {
            return Err(GameError::AlreadyPlaying);
        }
        if members.len() != REQUIRED_PLAYERS {
            return Err(GameError::WrongPlayerCount {
                expected: REQUIRED_PLAYERS,
                actual: members.len(),
            });
        }

        self.roster = members;
        self.total_scores = self.roster.iter().map(|p| (p.id, 0)).collect();
        self.phase = GamePhase::CountingDown;
        self.started_at = Some(Instant::now());
        tracing::info!(players = self.roster.len(), "game starting");

        Ok(Effects::none().timer(TimerCmd::Countdown {
            kind: CountdownKind::GameStart,
            secs: self.config.start_countdown_secs,
        }))
    }

    // -- Timer delivery -----------------------------------------------------

    /// Maps a countdown tick to its broadcast event, if the session is
    /// still in the phase that timer belongs to.
    pub fn tick_event(&self, kind: CountdownKind, remaining: u32) -> Option<ServerEvent> {
        match (kind, self.phase) {
            (CountdownKind::GameStart, GamePhase::CountingDown) => {
                Some(ServerEvent::GameStartCountdown {
                    countdown: remaining,
                })
            }
            (CountdownKind::NextRound, GamePhase::RoundCountdown) => {
                Some(ServerEvent::NextRoundCountdown {
                    countdown: remaining,
                })
            }
            (CountdownKind::Round, GamePhase::Playing) => Some(ServerEvent::RoundTimerUpdate {
                time_remaining: remaining,
                round: self.current_round,
            }),
            _ => None,
        }
    }

    /// Advances the machine when a countdown runs out.
    ///
    /// Expiries arriving in the wrong phase are stale (their timer was
    /// superseded between send and receive) and advance nothing.
    pub fn countdown_elapsed(&mut self, kind: CountdownKind, rng: &mut impl Rng) -> Effects {
        match (kind, self.phase) {
            (CountdownKind::GameStart, GamePhase::CountingDown) => self.begin_round(1, rng),
            (CountdownKind::NextRound, GamePhase::RoundCountdown) => {
                self.begin_round(self.current_round + 1, rng)
            }
            (CountdownKind::Round, GamePhase::Playing) => {
                tracing::info!(round = self.current_round, "round deadline reached");
                self.resolve_round(None)
            }
            _ => {
                tracing::debug!(?kind, phase = %self.phase, "stale timer expiry dropped");
                Effects::none()
            }
        }
    }

    // -- Round lifecycle ----------------------------------------------------

    /// Deals a fresh round and opens the guess window.
    fn begin_round(&mut self, round: u32, rng: &mut impl Rng) -> Effects {
        let ids: Vec<PlayerId> = self.roster.iter().map(|p| p.id).collect();
        self.cards = assign_roles(&ids, rng);
        self.mantri_id = holder_of(&self.cards, Role::Mantri);
        self.chor_id = holder_of(&self.cards, Role::Chor);
        self.current_round = round;
        self.phase = GamePhase::Playing;

        let Some(mantri) = self.mantri_id.and_then(|id| self.view_of(id)) else {
            return self.abort_internal("deal produced no Mantri");
        };
        tracing::info!(round, mantri = %mantri.id, "round dealt");

        let announce = if round == 1 {
            ServerEvent::GameActuallyStarted {
                current_round: round,
                max_rounds: self.config.max_rounds,
                players: self.roster.clone(),
                mantri_player: mantri,
            }
        } else {
            ServerEvent::NextRoundActuallyStarted {
                current_round: round,
                mantri_player: mantri,
            }
        };

        let mut effects = Effects::none().broadcast(announce).timer(TimerCmd::Countdown {
            kind: CountdownKind::Round,
            secs: self.config.round_secs,
        });
        for (&id, &card) in &self.cards {
            effects = effects.to(id, ServerEvent::YourCard { card, round });
        }
        effects
    }

    /// Handles the Mantri's guess.
    pub fn make_guess(
        &mut self,
        player: PlayerId,
        target: PlayerId,
    ) -> Result<Effects, GameError> {
        if self.phase != GamePhase::Playing {
            return Err(GameError::NotInProgress);
        }
        if self.mantri_id != Some(player) {
            return Err(GameError::NotMantri(player));
        }
        if target == player {
            return Err(GameError::SelfGuess);
        }
        if !self.cards.contains_key(&target) {
            return Err(GameError::InvalidTarget(target));
        }
        Ok(self.resolve_round(Some(target)))
    }

    /// Scores the current round and either schedules the next one or
    /// finishes the game. `guess` is `None` on deadline expiry.
    fn resolve_round(&mut self, guess: Option<PlayerId>) -> Effects {
        self.phase = GamePhase::RoundResolving;

        let (Some(mantri_id), Some(chor_id)) = (self.mantri_id, self.chor_id) else {
            return self.abort_internal("resolving a round with no deal");
        };
        let Some(chor) = self.view_of(chor_id) else {
            return self.abort_internal("deal references a player outside the roster");
        };

        let correct = guess == Some(chor_id);
        let scores = round_scores(&self.cards, correct);
        for (&id, &pts) in &scores {
            *self.total_scores.entry(id).or_insert(0) += pts;
        }
        self.round_history.push(RoundRecord {
            round: self.current_round,
            guessed_player_id: guess,
            correct,
            timed_out: guess.is_none(),
            mantri_id,
            chor_id,
            round_scores: scores.clone(),
        });
        tracing::info!(
            round = self.current_round,
            correct,
            timed_out = guess.is_none(),
            "round resolved"
        );

        let reveal = match guess.and_then(|id| self.view_of(id)) {
            Some(guessed) => ServerEvent::GuessResult {
                is_correct: correct,
                guessed_player: guessed,
                chor_player: chor,
                round_scores: scores,
                total_scores: self.total_scores.clone(),
                cards: self.cards.clone(),
            },
            None => ServerEvent::RoundTimeout {
                round_scores: scores,
                total_scores: self.total_scores.clone(),
                cards: self.cards.clone(),
                chor_player: chor,
            },
        };

        if self.current_round >= self.config.max_rounds {
            self.phase = GamePhase::Finished;
            self.ended_at = Some(Instant::now());
            let results = self.compute_results();
            tracing::info!(rounds = self.round_history.len(), "game finished");
            Effects::none()
                .broadcast(reveal)
                .broadcast(ServerEvent::GameFinished { results })
                .timer(TimerCmd::CancelAll)
        } else {
            self.phase = GamePhase::RoundCountdown;
            Effects::none().broadcast(reveal).timer(TimerCmd::Countdown {
                kind: CountdownKind::NextRound,
                secs: self.config.next_round_countdown_secs,
            })
        }
    }

    /// Creator-initiated skip of the between-rounds countdown.
    pub fn skip_countdown(&mut self, rng: &mut impl Rng) -> Result<Effects, GameError> {
        if self.phase != GamePhase::RoundCountdown {
            return Err(GameError::NoCountdownToSkip);
        }
        Ok(self.begin_round(self.current_round + 1, rng))
    }

    // -- Termination and rematch --------------------------------------------

    /// Ends an in-flight game early, freezing scores as they stand.
    /// No-op while waiting or already finished.
    pub fn force_end(&mut self, reason: &str) -> Effects {
        if !self.phase.is_active() {
            return Effects::none();
        }
        self.phase = GamePhase::Finished;
        self.ended_at = Some(Instant::now());
        let results = self.compute_results();
        tracing::warn!(reason, rounds = self.round_history.len(), "game force-ended");
        Effects::none()
            .broadcast(ServerEvent::GameForceEnded {
                reason: reason.to_owned(),
                results,
            })
            .timer(TimerCmd::CancelAll)
    }

    /// Records a play-again vote. Unanimity is judged over `members`, the
    /// room's membership at vote time, so a player who left after the game
    /// cannot block the rematch. A unanimous yes resets the session.
    pub fn play_again(
        &mut self,
        player: PlayerId,
        accepted: bool,
        members: &[PlayerId],
    ) -> Result<Effects, GameError> {
        if self.phase != GamePhase::Finished {
            return Err(GameError::NotFinished);
        }
        if !members.contains(&player) {
            return Err(GameError::NotInRoom(player));
        }

        self.play_again.insert(player, accepted);
        let all_accepted = !members.is_empty()
            && members
                .iter()
                .all(|id| self.play_again.get(id) == Some(&true));

        let mut effects = Effects::none().broadcast(ServerEvent::PlayAgainUpdate {
            player_id: player,
            accepted,
            all_accepted,
        });
        if all_accepted {
            tracing::info!("unanimous play-again, resetting session");
            self.reset_game();
            effects.reset = true;
        }
        Ok(effects)
    }

    /// Returns the session to a fresh waiting state. Idempotent.
    pub fn reset_game(&mut self) {
        self.phase = GamePhase::Waiting;
        self.current_round = 0;
        self.roster.clear();
        self.cards.clear();
        self.mantri_id = None;
        self.chor_id = None;
        self.total_scores.clear();
        self.round_history.clear();
        self.play_again.clear();
        self.started_at = None;
        self.ended_at = None;
    }

    // -- Results ------------------------------------------------------------

    /// Final standings. Only valid once the game has finished.
    pub fn results(&self) -> Result<GameResults, GameError> {
        if self.phase != GamePhase::Finished {
            return Err(GameError::NotFinished);
        }
        Ok(self.compute_results())
    }

    fn compute_results(&self) -> GameResults {
        // Stable sort: roster (join) order breaks score ties.
        let mut seats: Vec<&PlayerView> = self.roster.iter().collect();
        seats.sort_by(|a, b| {
            let sa = self.total_scores.get(&a.id).copied().unwrap_or(0);
            let sb = self.total_scores.get(&b.id).copied().unwrap_or(0);
            sb.cmp(&sa)
        });

        let rankings: Vec<RankedPlayer> = seats
            .iter()
            .enumerate()
            .map(|(rank, p)| RankedPlayer {
                rank,
                player_id: p.id,
                name: p.name.clone(),
                score: self.total_scores.get(&p.id).copied().unwrap_or(0),
            })
            .collect();

        let rounds_played = self.round_history.len() as u32;
        let winner = if rounds_played > 0 {
            rankings.first().cloned()
        } else {
            None
        };
        let duration_ms = match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => end.duration_since(start).as_millis() as u64,
            (Some(start), None) => start.elapsed().as_millis() as u64,
            _ => 0,
        };
        let total: u32 = rankings.iter().map(|r| r.score).sum();
        let slots = rankings.len() as u32 * rounds_played;
        let average_score = if slots > 0 { (total + slots / 2) / slots } else { 0 };

        GameResults {
            rankings,
            winner,
            duration_ms,
            rounds_played,
            average_score,
        }
    }

    // -- Helpers ------------------------------------------------------------

    fn view_of(&self, id: PlayerId) -> Option<PlayerView> {
        self.roster.iter().find(|p| p.id == id).cloned()
    }

    /// Broken internal invariant: log it and end the game rather than
    /// panic inside the room actor.
    fn abort_internal(&mut self, what: &str) -> Effects {
        tracing::error!(round = self.current_round, what, "game state corrupt");
        self.force_end("internal error")
    }
}
