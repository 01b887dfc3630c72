//! Shared fixtures for the control tests.

#![allow(dead_code)]

use ampctl_control::{AmpChannels, AmpTiming, Amplifier};
use ampctl_core::{AmpEvent, AmpStatus, CoreError, Level, OutputLine, PlayerCommand};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;

pub const DRIVER_PROTECT: Duration = Duration::from_millis(1500);
pub const PAUSE_TIMEOUT: Duration = Duration::from_secs(300);

pub fn timing() -> AmpTiming {
    AmpTiming {
        driver_protect: DRIVER_PROTECT,
        pause_timeout: PAUSE_TIMEOUT,
    }
}

/// Relay line that records every level written to it
#[derive(Clone, Default)]
pub struct RecordingLine {
    writes: Arc<Mutex<Vec<Level>>>,
    failing: bool,
}

impl RecordingLine {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<Level> {
        self.writes.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Level> {
        self.writes.lock().unwrap().last().copied()
    }
}

impl OutputLine for RecordingLine {
    fn write_level(&mut self, level: Level) -> ampctl_core::Result<()> {
        if self.failing {
            return Err(CoreError::line_write(99, "simulated write failure"));
        }
        self.writes.lock().unwrap().push(level);
        Ok(())
    }
}

/// Amplifier wired to in-memory channels
pub struct Rig {
    pub amp: Amplifier<RecordingLine>,
    pub power: RecordingLine,
    pub mute: RecordingLine,
    pub events_tx: UnboundedSender<AmpEvent>,
    pub events: UnboundedReceiver<AmpEvent>,
    pub commands: UnboundedReceiver<PlayerCommand>,
    pub status: watch::Receiver<AmpStatus>,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_lines(RecordingLine::default(), RecordingLine::default())
    }

    pub fn with_lines(power: RecordingLine, mute: RecordingLine) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(AmpStatus::default());
        let amp = Amplifier::new(
            power.clone(),
            mute.clone(),
            timing(),
            AmpChannels {
                events: events_tx.clone(),
                commands: commands_tx,
                status: status_tx,
            },
        );
        Self {
            amp,
            power,
            mute,
            events_tx,
            events,
            commands,
            status,
        }
    }

    /// A rig that has been initialized to the cold state
    pub fn cold() -> Self {
        let mut rig = Self::new();
        rig.amp.initialize();
        rig
    }

    pub fn dispatch(&mut self, event: AmpEvent) {
        self.amp.dispatch(event).unwrap();
    }

    pub fn take_commands(&mut self) -> Vec<PlayerCommand> {
        let mut commands = Vec::new();
        while let Ok(command) = self.commands.try_recv() {
            commands.push(command);
        }
        commands
    }

    pub fn take_timer_events(&mut self) -> Vec<AmpEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Advance paused time and dispatch whatever the timers delivered
    pub async fn elapse(&mut self, duration: Duration) -> Vec<AmpEvent> {
        tokio::time::advance(duration).await;
        settle().await;
        let fired = self.take_timer_events();
        for event in &fired {
            self.dispatch(*event);
        }
        fired
    }

    /// Switch on and let the driver-protect delay run out
    pub async fn powered_on(&mut self) {
        self.dispatch(AmpEvent::SwitchOn);
        self.elapse(DRIVER_PROTECT).await;
        self.take_commands();
    }
}

/// Let spawned timer tasks run
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
