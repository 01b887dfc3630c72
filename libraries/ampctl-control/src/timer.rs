//! Cancellable one-shot timers
//!
//! A [`TimerSlot`] holds at most one in-flight timer. Starting a new timer
//! replaces the previous one. Every start bumps a generation counter; the
//! fired task re-checks its generation under the slot lock before running its
//! callback, so a timer that loses a race against `cancel` or a restart never
//! delivers.

use ampctl_core::AmpEvent;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

/// Queue `event` from a timer callback
pub(crate) fn deliver(events: &UnboundedSender<AmpEvent>, event: AmpEvent) {
    if events.send(event).is_err() {
        trace!(?event, "Event queue closed, timer event dropped");
    }
}

#[derive(Default)]
struct SlotState {
    generation: u64,
    pending: bool,
    task: Option<JoinHandle<()>>,
}

/// One replaceable timer
#[derive(Clone)]
pub struct TimerSlot {
    name: &'static str,
    state: Arc<Mutex<SlotState>>,
}

impl TimerSlot {
    /// Create an idle slot; `name` is used in traces
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Arc::new(Mutex::new(SlotState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the timer, replacing any pending one
    ///
    /// `on_fire` runs once after `delay` unless the slot is cancelled or
    /// restarted first. It runs while the slot is locked and must not block.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&self, delay: Duration, on_fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.lock();
        state.generation = state.generation.wrapping_add(1);
        if let Some(previous) = state.task.take() {
            previous.abort();
        }
        state.pending = true;

        let generation = state.generation;
        let deadline = Instant::now() + delay;
        let slot = self.clone();
        state.task = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let mut state = slot.lock();
            if state.generation != generation {
                trace!(timer = slot.name, "Stale timer dropped");
                return;
            }
            state.pending = false;
            state.task = None;
            trace!(timer = slot.name, "Timer fired");
            on_fire();
        }));
        trace!(timer = self.name, delay_ms = delay.as_millis() as u64, "Timer started");
    }

    /// Cancel the pending timer
    ///
    /// Returns `true` if a timer was pending and will now never fire.
    pub fn cancel(&self) -> bool {
        let mut state = self.lock();
        state.generation = state.generation.wrapping_add(1);
        if let Some(task) = state.task.take() {
            task.abort();
        }
        let was_pending = std::mem::replace(&mut state.pending, false);
        if was_pending {
            trace!(timer = self.name, "Timer cancelled");
        }
        was_pending
    }

    /// Whether a timer is waiting to fire
    pub fn is_pending(&self) -> bool {
        self.lock().pending
    }
}

impl std::fmt::Debug for TimerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerSlot")
            .field("name", &self.name)
            .field("pending", &self.is_pending())
            .finish()
    }
}
