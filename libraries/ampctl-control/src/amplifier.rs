//! Amplifier state machine
//!
//! [`Amplifier`] owns both relay lines and processes one [`AmpEvent`] at a
//! time. It is driven by [`run_dispatcher`], the only task that ever touches
//! it; every producer (input handler, player listener, timers) feeds the same
//! event queue.
//!
//! # Transitions
//!
//! | Event | Guard | Effect |
//! |-------|-------|--------|
//! | `SwitchOn` | off | power on |
//! | `SwitchOff` | | power off, disarm pause timeout, `Stop` |
//! | `MuteOn` | | mute, `Pause(true)`, arm pause timeout |
//! | `MuteOff` | | unmute, disarm pause timeout, `Pause(false)` |
//! | `MuteToggle` | on | `MuteOn` or `MuteOff` depending on the mute state |
//! | `RotateVolume(d)` | on | `ChangeVolume(d)` |
//! | `PlayerPlaying` | | unmute if on, else power on; disarm pause timeout |
//! | `PlayerPaused` | | mute, arm pause timeout |
//! | `PlayerStopped` | | disarm pause timeout, power off |
//! | `PauseTimeoutFired` | armed | disarm, power off, mute, `Stop` |
//! | `DriverProtectElapsed` | pending | unmute; `Play` if the previous event was `SwitchOn` |
//! | `LongPress` | on | as `SwitchOff` |
//! | `DoubleClick` | on | `NextTrack` |
//!
//! Powering on always mutes first, raises the power relay and starts the
//! driver-protect timer; the unmute arrives later as `DriverProtectElapsed`.
//! Setting power or mute to its current value writes nothing.

use crate::error::{ControlError, Result};
use crate::timer::{deliver, TimerSlot};
use ampctl_core::{
    AmpEvent, AmpStatus, Level, MuteState, OutputLine, PlayerCommand, PowerState,
};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tracing::{debug, error, info, trace};

/// Amplifier timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmpTiming {
    /// Delay between power-on and unmute
    pub driver_protect: Duration,
    /// How long the amplifier may stay muted before switching off
    pub pause_timeout: Duration,
}

impl Default for AmpTiming {
    fn default() -> Self {
        Self {
            driver_protect: Duration::from_millis(1500),
            pause_timeout: Duration::from_secs(300),
        }
    }
}

/// Channels connecting the amplifier to the rest of the worker
#[derive(Debug)]
pub struct AmpChannels {
    /// The dispatcher's own queue, used by timers to deliver their events
    pub events: UnboundedSender<AmpEvent>,
    /// Outbound player commands, in dispatch order
    pub commands: UnboundedSender<PlayerCommand>,
    /// Status snapshot published after every dispatch
    pub status: watch::Sender<AmpStatus>,
}

/// The amplifier and its two relays
pub struct Amplifier<L: OutputLine> {
    power_line: L,
    mute_line: L,
    power: Option<PowerState>,
    mute: Option<MuteState>,
    pause_armed: bool,
    driver_protect_pending: bool,
    last_event: Option<AmpEvent>,
    timing: AmpTiming,
    pause_timer: TimerSlot,
    driver_protect_timer: TimerSlot,
    channels: AmpChannels,
}

impl<L: OutputLine> Amplifier<L> {
    /// Wrap the two relay lines
    ///
    /// The state is unknown until [`initialize`](Self::initialize) drives the
    /// relays to off and muted.
    pub fn new(power_line: L, mute_line: L, timing: AmpTiming, channels: AmpChannels) -> Self {
        Self {
            power_line,
            mute_line,
            power: None,
            mute: None,
            pause_armed: false,
            driver_protect_pending: false,
            last_event: None,
            timing,
            pause_timer: TimerSlot::new("pause-timeout"),
            driver_protect_timer: TimerSlot::new("driver-protect"),
            channels,
        }
    }

    /// Force both relays to the cold state (off, muted)
    pub fn initialize(&mut self) {
        self.set_mute(MuteState::Muted);
        self.set_power(PowerState::Off);
        self.publish();
    }

    /// Current relay state; unknown fields read as the cold state
    pub fn status(&self) -> AmpStatus {
        AmpStatus {
            power: self.power.unwrap_or(PowerState::Off),
            mute: self.mute.unwrap_or(MuteState::Muted),
        }
    }

    /// Whether a pause timeout is pending
    pub fn pause_armed(&self) -> bool {
        self.pause_armed
    }

    /// Whether a driver-protect unmute is pending
    pub fn driver_protect_pending(&self) -> bool {
        self.driver_protect_pending
    }

    fn is_on(&self) -> bool {
        self.power == Some(PowerState::On)
    }

    /// Process one event
    ///
    /// Fails only when the player command queue is gone.
    pub fn dispatch(&mut self, event: AmpEvent) -> Result<()> {
        let previous = self.last_event.replace(event);
        debug!(?event, "Dispatching event");

        match event {
            AmpEvent::SwitchOn => {
                if !self.is_on() {
                    self.set_power(PowerState::On);
                }
            }
            AmpEvent::SwitchOff => self.switch_off()?,
            AmpEvent::MuteOn => self.mute_on()?,
            AmpEvent::MuteOff => self.mute_off()?,
            AmpEvent::MuteToggle => {
                if !self.is_on() {
                    trace!("Mute toggle ignored while off");
                } else if self.mute == Some(MuteState::Muted) {
                    self.mute_off()?;
                } else {
                    self.mute_on()?;
                }
            }
            AmpEvent::RotateVolume(delta) => {
                if self.is_on() {
                    self.send(PlayerCommand::ChangeVolume(delta))?;
                }
            }
            AmpEvent::PlayerPlaying => {
                if self.is_on() {
                    self.set_mute(MuteState::Unmuted);
                } else {
                    self.set_power(PowerState::On);
                }
                self.disarm_pause_timeout();
            }
            AmpEvent::PlayerPaused => {
                self.set_mute(MuteState::Muted);
                self.arm_pause_timeout();
            }
            AmpEvent::PlayerStopped => {
                self.disarm_pause_timeout();
                self.set_power(PowerState::Off);
            }
            AmpEvent::PauseTimeoutFired => {
                if self.pause_armed {
                    self.pause_armed = false;
                    self.set_power(PowerState::Off);
                    self.set_mute(MuteState::Muted);
                    self.send(PlayerCommand::Stop)?;
                } else {
                    trace!("Stale pause timeout dropped");
                }
            }
            AmpEvent::DriverProtectElapsed => {
                if self.driver_protect_pending {
                    self.driver_protect_pending = false;
                    self.set_mute(MuteState::Unmuted);
                    if previous == Some(AmpEvent::SwitchOn) {
                        self.send(PlayerCommand::Play)?;
                    }
                } else {
                    trace!("Stale driver protect dropped");
                }
            }
            AmpEvent::LongPress => {
                if self.is_on() {
                    self.switch_off()?;
                }
            }
            AmpEvent::DoubleClick => {
                if self.is_on() {
                    self.send(PlayerCommand::NextTrack)?;
                }
            }
        }

        self.publish();
        Ok(())
    }

    fn switch_off(&mut self) -> Result<()> {
        self.set_power(PowerState::Off);
        self.disarm_pause_timeout();
        self.send(PlayerCommand::Stop)
    }

    fn mute_on(&mut self) -> Result<()> {
        self.set_mute(MuteState::Muted);
        self.send(PlayerCommand::Pause(true))?;
        self.arm_pause_timeout();
        Ok(())
    }

    fn mute_off(&mut self) -> Result<()> {
        self.set_mute(MuteState::Unmuted);
        self.disarm_pause_timeout();
        self.send(PlayerCommand::Pause(false))
    }

    fn set_power(&mut self, state: PowerState) {
        if self.power == Some(state) {
            return;
        }
        info!(?state, "Amplifier power changing");
        self.power = Some(state);

        match state {
            PowerState::On => {
                self.set_mute(MuteState::Muted);
                drive(&mut self.power_line, "power", state.relay_level());
                self.driver_protect_pending = true;
                let events = self.channels.events.clone();
                self.driver_protect_timer
                    .start(self.timing.driver_protect, move || {
                        deliver(&events, AmpEvent::DriverProtectElapsed);
                    });
            }
            PowerState::Off => {
                drive(&mut self.power_line, "power", state.relay_level());
                if self.driver_protect_pending {
                    self.driver_protect_pending = false;
                    self.driver_protect_timer.cancel();
                }
            }
        }
    }

    fn set_mute(&mut self, state: MuteState) {
        if self.mute == Some(state) {
            return;
        }
        info!(?state, "Mute changing");
        self.mute = Some(state);
        drive(&mut self.mute_line, "mute", state.relay_level());
    }

    fn arm_pause_timeout(&mut self) {
        if self.pause_armed {
            return;
        }
        self.pause_armed = true;
        let events = self.channels.events.clone();
        self.pause_timer.start(self.timing.pause_timeout, move || {
            deliver(&events, AmpEvent::PauseTimeoutFired);
        });
        debug!(
            timeout_secs = self.timing.pause_timeout.as_secs(),
            "Pause timeout armed"
        );
    }

    fn disarm_pause_timeout(&mut self) {
        if self.pause_armed {
            self.pause_armed = false;
            self.pause_timer.cancel();
            debug!("Pause timeout disarmed");
        }
    }

    fn send(&self, command: PlayerCommand) -> Result<()> {
        debug!(?command, "Queueing player command");
        self.channels
            .commands
            .send(command)
            .map_err(|_| ControlError::CommandQueueClosed)
    }

    fn publish(&self) {
        self.channels.status.send_replace(self.status());
    }
}

/// Write a relay level; failures are logged and otherwise ignored
fn drive<L: OutputLine>(line: &mut L, relay: &'static str, level: Level) {
    if let Err(e) = line.write_level(level) {
        error!(relay, ?level, error = %e, "Relay write failed");
    }
}

impl<L: OutputLine> std::fmt::Debug for Amplifier<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Amplifier")
            .field("power", &self.power)
            .field("mute", &self.mute)
            .field("pause_armed", &self.pause_armed)
            .field("driver_protect_pending", &self.driver_protect_pending)
            .field("last_event", &self.last_event)
            .finish_non_exhaustive()
    }
}

/// Drive the amplifier from its event queue
///
/// Initializes the relays, then dispatches events one at a time until the
/// queue closes or the player command queue is gone.
pub async fn run_dispatcher<L: OutputLine>(
    mut amplifier: Amplifier<L>,
    mut events: UnboundedReceiver<AmpEvent>,
) -> Result<()> {
    amplifier.initialize();
    info!("Dispatcher started");

    while let Some(event) = events.recv().await {
        amplifier.dispatch(event)?;
    }

    debug!("Event queue closed");
    Ok(())
}
