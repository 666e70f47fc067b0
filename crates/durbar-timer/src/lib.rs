//! Cancellable timers for durbar room phases.
//!
//! Two shapes cover every phase of the game loop:
//!
//! - [`countdown`]: emits a [`TimerEvent::Tick`] once per second with the
//!   seconds remaining, then [`TimerEvent::Elapsed`] when it reaches zero.
//!   Used for the game-start countdown, the next-round countdown, and the
//!   round deadline (which is just a 30-second countdown whose ticks become
//!   `roundTimerUpdate` broadcasts).
//! - [`after`]: a plain one-shot delay delivering a single message.
//!
//! Timers never call back into room state directly. They deliver messages
//! into the room actor's command channel, so expiry re-enters the same
//! serialized mutation path as client intents.
//!
//! # Cancellation
//!
//! [`TimerHandle::cancel`] aborts the timer task: once it returns, the
//! timer will emit nothing further. A message that was already queued on
//! the channel may still be delivered, which is why consumers pair every
//! timer with a generation number and drop messages from superseded
//! timers. Dropping a handle also cancels: a room actor that goes away
//! takes its timers with it.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::trace;

/// What a countdown timer reports as it runs down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// One second boundary; `remaining` counts down from the initial value
    /// to 1.
    Tick { remaining: u32 },
    /// The countdown reached zero.
    Elapsed,
}

/// Handle to a running timer task. Cancelling (or dropping) the handle
/// stops the timer.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Stops the timer. After this returns the timer emits nothing further.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Whether the timer task has run to completion or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Starts a countdown of `secs` seconds.
///
/// Emits `Tick { remaining: secs }` immediately, then a tick each second
/// down to 1, then `Elapsed` after the final second. A zero-second
/// countdown emits only `Elapsed`.
///
/// `wrap` converts each [`TimerEvent`] into the consumer's message type
/// (typically a room actor command carrying a generation number).
pub fn countdown<M, F>(secs: u32, tx: mpsc::Sender<M>, wrap: F) -> TimerHandle
where
    M: Send + 'static,
    F: Fn(TimerEvent) -> M + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut remaining = secs;
        while remaining > 0 {
            trace!(remaining, "countdown tick");
            if tx.send(wrap(TimerEvent::Tick { remaining })).await.is_err() {
                // Receiver gone; the room is shutting down.
                return;
            }
            time::sleep(Duration::from_secs(1)).await;
            remaining -= 1;
        }
        trace!("countdown elapsed");
        let _ = tx.send(wrap(TimerEvent::Elapsed)).await;
    });
    TimerHandle { task }
}

/// Delivers `msg` once after `delay`.
pub fn after<M>(delay: Duration, tx: mpsc::Sender<M>, msg: M) -> TimerHandle
where
    M: Send + 'static,
{
    let task = tokio::spawn(async move {
        time::sleep(delay).await;
        trace!(?delay, "one-shot timer elapsed");
        let _ = tx.send(msg).await;
    });
    TimerHandle { task }
}
