//! Tokio-backed timers for controller effects.
//!
//! [`TimerSet`] turns [`Effect::ScheduleTimer`] and [`Effect::CancelTimer`]
//! into real sleeps. A firing is delivered on the receiver returned by
//! [`TimerSet::new`] as the timer's id; the runtime feeds it back as
//! [`Event::TimerFired`](crate::controller::Event::TimerFired). Cancelled
//! timers are aborted and never delivered.

use crate::controller::{Effect, TimerId};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A spawned sleep. Dropping the handle aborts it.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The set of armed timers for one session.
///
/// Must be used from within a Tokio runtime.
#[derive(Debug)]
pub struct TimerSet {
    armed: HashMap<TimerId, TimerHandle>,
    tx: mpsc::UnboundedSender<TimerId>,
}

impl TimerSet {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerId>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let set = Self {
            armed: HashMap::new(),
            tx,
        };
        (set, rx)
    }

    /// Arm a timer that delivers `id` after `after`.
    pub fn schedule(&mut self, id: TimerId, after: Duration) {
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            // The receiver is gone once the session is shut down.
            let _ = tx.send(id);
        });
        self.armed.insert(id, TimerHandle { task });
    }

    /// Disarm a timer. Returns whether it was still armed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.armed.remove(&id).is_some()
    }

    /// Carry out the timer effects of one transition. Other effects are ignored.
    pub fn apply(&mut self, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::ScheduleTimer { id, kind, after } => {
                    tracing::trace!(%id, ?kind, ?after, "timer scheduled");
                    self.schedule(*id, *after);
                }
                Effect::CancelTimer(id) => {
                    if self.cancel(*id) {
                        tracing::trace!(%id, "timer cancelled");
                    }
                }
                Effect::PhaseChanged { .. } | Effect::ResultsReady => {}
            }
        }
    }

    /// Forget a timer that has delivered its firing.
    pub fn fired(&mut self, id: TimerId) {
        self.armed.remove(&id);
    }

    /// Abort every armed timer.
    pub fn clear(&mut self) {
        self.armed.clear();
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }
}
