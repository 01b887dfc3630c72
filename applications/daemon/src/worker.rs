/// One worker: the full input, dispatch and player pipeline
use crate::config::AmpConfig;
use crate::error::{DaemonError, Result};
use ampctl_control::{run_dispatcher, AmpChannels, Amplifier, Gesture, GestureDecoder, InputHandler};
use ampctl_core::{AmpStatus, Level};
use ampctl_gpio::{Edge, EdgeInput, SysfsGpio};
use ampctl_player::{
    run_commands, run_listener, MpdConnector, PlayerConnector, PlayerLink, ServiceRestarter,
    ShellRestarter,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

/// Input lines with the decoder and handler they feed
struct InputLoop {
    button: EdgeInput,
    encoder_a: EdgeInput,
    encoder_b: EdgeInput,
    decoder: GestureDecoder,
    handler: InputHandler,
}

/// What woke the input loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Button,
    Encoder,
}

/// One of the three input lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    Button,
    EncoderA,
    EncoderB,
}

impl InputLoop {
    async fn run(self) -> Result<()> {
        let Self {
            button,
            encoder_a,
            encoder_b,
            mut decoder,
            handler,
        } = self;

        loop {
            let settle = decoder.settle_deadline();
            let settle_at = tokio::time::Instant::from_std(settle.unwrap_or_else(Instant::now));

            let wake = tokio::select! {
                ready = button.wait_edge() => {
                    ready?;
                    Wake::Button
                }
                ready = encoder_a.wait_edge() => {
                    ready?;
                    Wake::Encoder
                }
                ready = encoder_b.wait_edge() => {
                    ready?;
                    Wake::Encoder
                }
                () = tokio::time::sleep_until(settle_at), if settle.is_some() => Wake::Button,
            };

            let gesture = decode(
                &mut decoder,
                wake,
                |line| match line {
                    Line::Button => button.read_level(),
                    Line::EncoderA => encoder_a.read_level(),
                    Line::EncoderB => encoder_b.read_level(),
                },
                Instant::now(),
            );

            if let Some(gesture) = gesture {
                handler.handle(gesture)?;
            }
        }
    }
}

/// Sample the lines behind `wake` and feed them to the decoder
///
/// Read failures are logged and produce no gesture.
fn decode<F>(decoder: &mut GestureDecoder, wake: Wake, read: F, now: Instant) -> Option<Gesture>
where
    F: Fn(Line) -> ampctl_gpio::Result<Level>,
{
    match wake {
        Wake::Button => match read(Line::Button) {
            Ok(level) => decoder.button(level, now),
            Err(e) => {
                error!(error = %e, "Button read failed");
                None
            }
        },
        Wake::Encoder => match (read(Line::EncoderA), read(Line::EncoderB)) {
            (Ok(a), Ok(b)) => decoder.encoder(a, b),
            (Err(e), _) | (_, Err(e)) => {
                error!(error = %e, "Encoder read failed");
                None
            }
        },
    }
}

/// Turn a finished task into the error that ends the worker
fn task_outcome<E>(
    task: &'static str,
    joined: std::result::Result<std::result::Result<(), E>, tokio::task::JoinError>,
) -> DaemonError
where
    E: Into<DaemonError>,
{
    match joined {
        Ok(Ok(())) => DaemonError::TaskExited(task),
        Ok(Err(e)) => e.into(),
        Err(e) => DaemonError::TaskFailed {
            task,
            message: e.to_string(),
        },
    }
}

/// Run one worker until something fatal happens
///
/// Lines are opened here and released when this returns, on every path.
pub async fn run(config: &AmpConfig) -> Result<()> {
    info!(pid = std::process::id(), "Worker starting");

    let gpio = SysfsGpio::new(&config.gpio.path);
    let power_relay = gpio.open_output(config.gpio.power_relay)?;
    let mute_relay = gpio.open_output(config.gpio.mute_relay)?;
    let button = gpio.open_input(config.gpio.button, Edge::Both)?;
    let encoder_a = gpio.open_input(config.gpio.encoder_a, Edge::Both)?;
    let encoder_b = gpio.open_input(config.gpio.encoder_b, Edge::Both)?;

    let decoder = GestureDecoder::new(
        config.timing.debounce(),
        button.read_level()?,
        encoder_a.read_level()?,
        encoder_b.read_level()?,
    );
    debug!(button_held = decoder.button_held(), "Initial input levels sampled");

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(AmpStatus::default());

    let amplifier = Amplifier::new(
        power_relay,
        mute_relay,
        config.timing.amplifier(),
        AmpChannels {
            events: events_tx.clone(),
            commands: commands_tx,
            status: status_tx,
        },
    );

    let connector: Arc<dyn PlayerConnector> = Arc::new(MpdConnector::new(
        config.player.host.clone(),
        config.player.port,
        config.player.connect_timeout(),
    ));
    let restarter = ShellRestarter::from_command(&config.player.restart_command)
        .map(|r| Arc::new(r) as Arc<dyn ServiceRestarter>);
    let policy = config.player.retry_policy();
    let command_link =
        PlayerLink::new("commands", Arc::clone(&connector), restarter.clone(), policy);
    let listener_link = PlayerLink::new("listener", connector, restarter, policy);

    let inputs = InputLoop {
        button: button.watch()?,
        encoder_a: encoder_a.watch()?,
        encoder_b: encoder_b.watch()?,
        decoder,
        handler: InputHandler::new(config.timing.input(), events_tx.clone(), status_rx),
    };

    let mut dispatcher = tokio::spawn(run_dispatcher(amplifier, events_rx));
    let mut commands = tokio::spawn(run_commands(command_link, commands_rx));
    let mut listener = tokio::spawn(run_listener(listener_link, events_tx));

    info!("Worker running");
    let err = tokio::select! {
        result = inputs.run() => match result {
            Ok(()) => DaemonError::TaskExited("input"),
            Err(e) => e,
        },
        joined = &mut dispatcher => task_outcome("dispatcher", joined),
        joined = &mut commands => task_outcome("commands", joined),
        joined = &mut listener => task_outcome("listener", joined),
    };

    dispatcher.abort();
    commands.abort();
    listener.abort();

    error!(error = %err, "Worker stopping");
    Err(err)
}
