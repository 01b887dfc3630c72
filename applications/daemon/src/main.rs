/// ampctl - amplifier power and mute controller for MPD
use ampctl::{config::AmpConfig, logging, worker, ProcessLauncher, Supervisor, Verbosity};
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ampctl")]
#[command(about = "Amplifier power and mute controller driven by a switch, an encoder and MPD", long_about = None)]
struct Cli {
    /// Log relay changes and worker lifecycle
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log every gesture and dispatched event
    #[arg(short, long, global = true)]
    debug: bool,

    /// Configuration file path
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Append logs to this file instead of stdout
    #[arg(short, long, global = true, value_name = "PATH")]
    logfile: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Supervise workers, restarting each one when it exits
    Run,
    /// Run a single worker in this process
    #[command(hide = true)]
    Worker,
    /// Validate the configuration and print a summary
    Check,
}

impl Cli {
    /// Arguments handed to every supervised worker
    fn worker_args(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        if self.verbose {
            args.push("--verbose".into());
        }
        if self.debug {
            args.push("--debug".into());
        }
        if let Some(path) = &self.config {
            args.push("--config".into());
            args.push(path.into());
        }
        if let Some(path) = &self.logfile {
            args.push("--logfile".into());
            args.push(path.into());
        }
        args.push("worker".into());
        args
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AmpConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command.as_ref().unwrap_or(&Commands::Run) {
        Commands::Run => {
            init_logging(&cli, &config)?;
            supervise(cli.worker_args()).await?;
        }
        Commands::Worker => {
            init_logging(&cli, &config)?;
            run_worker(&config).await?;
        }
        Commands::Check => {
            print_summary(&config);
        }
    }

    Ok(())
}

fn init_logging(cli: &Cli, config: &AmpConfig) -> anyhow::Result<()> {
    let file = cli.logfile.as_deref().or(config.log.file.as_deref());
    logging::init(Verbosity::from_flags(cli.verbose, cli.debug), file)?;
    Ok(())
}

async fn supervise(args: Vec<OsString>) -> anyhow::Result<()> {
    let mut supervisor = Supervisor::new(ProcessLauncher::current_exe(args)?);

    let interrupted = tokio::select! {
        result = supervisor.run() => {
            result?;
            false
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            true
        }
    };

    if interrupted {
        tracing::info!(
            launches = supervisor.launches(),
            "Interrupted, stopping supervisor"
        );
    }
    Ok(())
}

async fn run_worker(config: &AmpConfig) -> anyhow::Result<()> {
    tokio::select! {
        result = worker::run(config) => result?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Interrupted, stopping worker");
        }
    }

    Ok(())
}

fn print_summary(config: &AmpConfig) {
    let gpio = &config.gpio;
    let timing = &config.timing;
    let player = &config.player;

    println!("Configuration OK");
    println!("  sysfs root:      {}", gpio.path.display());
    println!(
        "  inputs:          button={} encoder_a={} encoder_b={}",
        gpio.button, gpio.encoder_a, gpio.encoder_b
    );
    println!(
        "  relays:          power={} mute={}",
        gpio.power_relay, gpio.mute_relay
    );
    println!(
        "  gestures:        debounce={}ms double_click={}ms long_press={}ms",
        timing.debounce_ms, timing.double_click_ms, timing.long_press_ms
    );
    println!(
        "  amplifier:       driver_protect={}ms pause_timeout={}s",
        timing.driver_protect_ms, timing.pause_timeout_secs
    );
    println!("  player:          {}:{}", player.host, player.port);
    println!(
        "  retry:           attempts={} backoff={}s timeout={}s",
        player.connect_attempts, player.backoff_secs, player.connect_timeout_secs
    );
    if player.restart_command.trim().is_empty() {
        println!("  restart:         disabled");
    } else {
        println!("  restart:         {}", player.restart_command);
    }
    match &config.log.file {
        Some(path) => println!("  log file:        {}", path.display()),
        None => println!("  log file:        stdout"),
    }
}
