/// Daemon error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DaemonError>;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("GPIO error: {0}")]
    Gpio(#[from] ampctl_gpio::GpioError),

    #[error("Player error: {0}")]
    Player(#[from] ampctl_player::PlayerError),

    #[error("Control error: {0}")]
    Control(#[from] ampctl_control::ControlError),

    #[error("Failed to spawn worker: {0}")]
    Spawn(String),

    #[error("Worker task {task} failed: {message}")]
    TaskFailed { task: &'static str, message: String },

    #[error("Worker task {0} exited unexpectedly")]
    TaskExited(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for DaemonError {
    fn from(err: config::ConfigError) -> Self {
        DaemonError::Config(err.to_string())
    }
}
