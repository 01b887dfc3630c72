//! End-to-end gesture tests: input handler feeding a running dispatcher.
//!
//! Time is paused and auto-advances while the test sleeps, so every timer
//! fires in order at its exact deadline.

mod common;

use ampctl_control::{
    run_dispatcher, AmpChannels, Amplifier, Gesture, GestureDecoder, InputHandler, InputTiming,
};
use ampctl_core::{AmpStatus, Level, MuteState, PlayerCommand, PowerState};
use common::RecordingLine;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::watch;
use tokio::time::sleep;

struct Worker {
    input: InputHandler,
    commands: UnboundedReceiver<PlayerCommand>,
    status: watch::Receiver<AmpStatus>,
}

impl Worker {
    fn start(timing: InputTiming) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(AmpStatus::default());

        let amplifier = Amplifier::new(
            RecordingLine::default(),
            RecordingLine::default(),
            common::timing(),
            AmpChannels {
                events: events_tx.clone(),
                commands: commands_tx,
                status: status_tx,
            },
        );
        tokio::spawn(run_dispatcher(amplifier, events_rx));

        let input = InputHandler::new(timing, events_tx, status.clone());
        Self {
            input,
            commands,
            status,
        }
    }

    fn status(&self) -> AmpStatus {
        *self.status.borrow()
    }

    fn take_commands(&mut self) -> Vec<PlayerCommand> {
        let mut commands = Vec::new();
        while let Ok(command) = self.commands.try_recv() {
            commands.push(command);
        }
        commands
    }

    async fn click(&self) {
        self.input.handle(Gesture::Press).unwrap();
        sleep(Duration::from_millis(100)).await;
        self.input.handle(Gesture::Release).unwrap();
    }

    /// Click while off and wait out the driver-protect delay
    async fn power_on(&mut self) {
        self.click().await;
        sleep(Duration::from_secs(2)).await;
        assert_eq!(self.status().mute, MuteState::Unmuted);
        self.take_commands();
    }
}

fn stops(commands: &[PlayerCommand]) -> usize {
    commands
        .iter()
        .filter(|c| **c == PlayerCommand::Stop)
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_press_while_off_switches_on() {
    let mut worker = Worker::start(InputTiming::default());

    worker.click().await;
    sleep(Duration::from_millis(10)).await;
    assert_eq!(worker.status().power, PowerState::On);
    assert_eq!(worker.status().mute, MuteState::Muted);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(worker.status().mute, MuteState::Unmuted);
    assert_eq!(worker.take_commands(), vec![PlayerCommand::Play]);
}

#[tokio::test(start_paused = true)]
async fn test_single_click_resolves_to_one_mute_toggle() {
    let mut worker = Worker::start(InputTiming::default());
    worker.power_on().await;

    worker.click().await;
    sleep(Duration::from_millis(500)).await;

    assert_eq!(worker.status().mute, MuteState::Muted);
    assert_eq!(worker.take_commands(), vec![PlayerCommand::Pause(true)]);

    worker.click().await;
    sleep(Duration::from_millis(500)).await;

    assert_eq!(worker.status().mute, MuteState::Unmuted);
    assert_eq!(worker.take_commands(), vec![PlayerCommand::Pause(false)]);
}

#[tokio::test(start_paused = true)]
async fn test_double_click_wins_over_mute_toggle() {
    let mut worker = Worker::start(InputTiming::default());
    worker.power_on().await;

    worker.click().await;
    sleep(Duration::from_millis(100)).await;
    worker.click().await;
    sleep(Duration::from_secs(1)).await;

    assert_eq!(worker.take_commands(), vec![PlayerCommand::NextTrack]);
    assert_eq!(worker.status().mute, MuteState::Unmuted);
}

#[tokio::test(start_paused = true)]
async fn test_holding_switches_off_exactly_once() {
    let mut worker = Worker::start(InputTiming::default());
    worker.power_on().await;

    worker.input.handle(Gesture::Press).unwrap();
    sleep(Duration::from_millis(1100)).await;
    worker.input.handle(Gesture::Release).unwrap();
    sleep(Duration::from_secs(1)).await;

    assert_eq!(worker.status().power, PowerState::Off);
    assert_eq!(stops(&worker.take_commands()), 1);
}

#[tokio::test(start_paused = true)]
async fn test_release_before_long_press_keeps_power() {
    let mut worker = Worker::start(InputTiming::default());
    worker.power_on().await;

    worker.input.handle(Gesture::Press).unwrap();
    sleep(Duration::from_millis(500)).await;
    worker.input.handle(Gesture::Release).unwrap();
    sleep(Duration::from_secs(2)).await;

    assert_eq!(worker.status().power, PowerState::On);
    assert_eq!(stops(&worker.take_commands()), 0);
}

#[tokio::test(start_paused = true)]
async fn test_long_press_cancels_pending_click_resolution() {
    let timing = InputTiming {
        double_click: Duration::from_secs(2),
        long_press: Duration::from_secs(1),
    };
    let mut worker = Worker::start(timing);
    worker.power_on().await;

    worker.input.handle(Gesture::Press).unwrap();
    sleep(Duration::from_millis(1100)).await;
    worker.input.handle(Gesture::Release).unwrap();
    sleep(Duration::from_secs(3)).await;

    assert_eq!(worker.status().power, PowerState::Off);
    assert_eq!(worker.take_commands(), vec![PlayerCommand::Stop]);
}

#[tokio::test(start_paused = true)]
async fn test_double_click_then_hold_also_switches_off() {
    let mut worker = Worker::start(InputTiming::default());
    worker.power_on().await;

    worker.click().await;
    sleep(Duration::from_millis(100)).await;
    worker.input.handle(Gesture::Press).unwrap();
    sleep(Duration::from_millis(1100)).await;
    worker.input.handle(Gesture::Release).unwrap();

    assert_eq!(
        worker.take_commands(),
        vec![PlayerCommand::NextTrack, PlayerCommand::Stop]
    );
    assert_eq!(worker.status().power, PowerState::Off);
}

#[tokio::test(start_paused = true)]
async fn test_rotation_follows_power_state() {
    let mut worker = Worker::start(InputTiming::default());

    worker.input.handle(Gesture::Rotate(1)).unwrap();
    sleep(Duration::from_millis(10)).await;
    assert!(worker.take_commands().is_empty());

    worker.power_on().await;
    worker.input.handle(Gesture::Rotate(-1)).unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(worker.take_commands(), vec![PlayerCommand::ChangeVolume(-1)]);
}

#[tokio::test(start_paused = true)]
async fn test_short_tap_with_debounced_release_is_not_a_long_press() {
    let mut worker = Worker::start(InputTiming::default());
    worker.power_on().await;

    let debounce = Duration::from_millis(50);
    let mut decoder = GestureDecoder::new(debounce, Level::High, Level::Low, Level::Low);
    let t0 = std::time::Instant::now();

    let press = decoder.button(Level::Low, t0).unwrap();
    worker.input.handle(press).unwrap();

    // the release edge arrives 30 ms later, inside the debounce interval
    sleep(Duration::from_millis(30)).await;
    assert_eq!(decoder.button(Level::High, t0 + Duration::from_millis(30)), None);

    // the input loop samples the line again once the interval is over
    let deadline = decoder.settle_deadline().unwrap();
    sleep(Duration::from_millis(20)).await;
    let release = decoder.button(Level::High, deadline).unwrap();
    assert_eq!(release, Gesture::Release);
    worker.input.handle(release).unwrap();

    sleep(Duration::from_secs(2)).await;

    assert_eq!(worker.status().power, PowerState::On);
    assert_eq!(worker.status().mute, MuteState::Muted);
    assert_eq!(worker.take_commands(), vec![PlayerCommand::Pause(true)]);
    assert!(!decoder.button_held());
}
