//! Gesture to event mapping
//!
//! | Gesture | Amplifier | Effect |
//! |---------|-----------|--------|
//! | press   | off       | `SwitchOn` |
//! | press   | on, click window open | cancel window, `DoubleClick` |
//! | press   | on        | open click window (resolves to `MuteToggle`) |
//! | press   | any       | start long-press timer (resolves to `LongPress`) |
//! | release | any       | cancel long-press timer |
//! | rotate  | any       | `RotateVolume` |

use crate::error::{ControlError, Result};
use crate::gesture::Gesture;
use crate::timer::{deliver, TimerSlot};
use ampctl_core::{AmpEvent, AmpStatus};
use std::time::Duration;
use tokio::sync::{mpsc::UnboundedSender, watch};
use tracing::{debug, trace};

/// Gesture timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputTiming {
    /// Window in which a second press makes a double click
    pub double_click: Duration,
    /// Hold time for a long press
    pub long_press: Duration,
}

impl Default for InputTiming {
    fn default() -> Self {
        Self {
            double_click: Duration::from_millis(300),
            long_press: Duration::from_secs(1),
        }
    }
}

/// Resolves gestures into dispatcher events
#[derive(Debug)]
pub struct InputHandler {
    timing: InputTiming,
    events: UnboundedSender<AmpEvent>,
    status: watch::Receiver<AmpStatus>,
    double_click: TimerSlot,
    long_press: TimerSlot,
}

impl InputHandler {
    /// Create a handler feeding `events`, reading power state from `status`
    pub fn new(
        timing: InputTiming,
        events: UnboundedSender<AmpEvent>,
        status: watch::Receiver<AmpStatus>,
    ) -> Self {
        Self {
            timing,
            events,
            status,
            double_click: TimerSlot::new("double-click"),
            long_press: TimerSlot::new("long-press"),
        }
    }

    fn emit(&self, event: AmpEvent) -> Result<()> {
        debug!(?event, "Gesture resolved");
        self.events
            .send(event)
            .map_err(|_| ControlError::EventQueueClosed)
    }

    /// Handle one decoded gesture
    ///
    /// Must be called from within a tokio runtime.
    pub fn handle(&self, gesture: Gesture) -> Result<()> {
        trace!(?gesture, "Gesture");
        match gesture {
            Gesture::Press => self.press(),
            Gesture::Release => {
                self.long_press.cancel();
                Ok(())
            }
            Gesture::Rotate(step) => self.emit(AmpEvent::RotateVolume(step)),
        }
    }

    fn press(&self) -> Result<()> {
        let powered = self.status.borrow().power.is_on();

        if !powered {
            self.emit(AmpEvent::SwitchOn)?;
        } else if self.double_click.cancel() {
            self.emit(AmpEvent::DoubleClick)?;
        } else {
            let events = self.events.clone();
            self.double_click.start(self.timing.double_click, move || {
                deliver(&events, AmpEvent::MuteToggle);
            });
        }

        let events = self.events.clone();
        let double_click = self.double_click.clone();
        self.long_press.start(self.timing.long_press, move || {
            double_click.cancel();
            deliver(&events, AmpEvent::LongPress);
        });
        Ok(())
    }
}
