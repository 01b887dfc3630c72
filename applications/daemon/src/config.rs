/// Daemon configuration
use crate::error::{DaemonError, Result};
use ampctl_control::{AmpTiming, InputTiming};
use ampctl_gpio::DEFAULT_SYSFS_ROOT;
use ampctl_player::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file used when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "ampctl.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AmpConfig {
    pub gpio: GpioSettings,

    #[serde(default = "default_timing")]
    pub timing: TimingSettings,

    #[serde(default = "default_player")]
    pub player: PlayerSettings,

    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GpioSettings {
    pub button: u32,
    pub encoder_a: u32,
    pub encoder_b: u32,
    pub power_relay: u32,
    pub mute_relay: u32,

    #[serde(default = "default_gpio_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingSettings {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_double_click_ms")]
    pub double_click_ms: u64,

    #[serde(default = "default_long_press_ms")]
    pub long_press_ms: u64,

    #[serde(default = "default_driver_protect_ms")]
    pub driver_protect_ms: u64,

    #[serde(default = "default_pause_timeout_secs")]
    pub pause_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,

    /// Shell command restarting the player; empty disables the restart step
    #[serde(default = "default_restart_command")]
    pub restart_command: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LogSettings {
    pub file: Option<PathBuf>,
}

impl AmpConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default file is optional.
    /// Environment variables prefixed with `AMPCTL_` override the file, with
    /// `__` separating sections (`AMPCTL_PLAYER__PORT=6601`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        settings = match path {
            Some(path) => settings.add_source(
                config::File::new(&path.to_string_lossy(), config::FileFormat::Toml)
                    .required(true),
            ),
            None => settings.add_source(
                config::File::new(DEFAULT_CONFIG_FILE, config::FileFormat::Toml).required(false),
            ),
        };

        settings = settings.add_source(
            config::Environment::with_prefix("AMPCTL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let pins = [
            ("button", self.gpio.button),
            ("encoder_a", self.gpio.encoder_a),
            ("encoder_b", self.gpio.encoder_b),
            ("power_relay", self.gpio.power_relay),
            ("mute_relay", self.gpio.mute_relay),
        ];
        let mut seen = HashSet::new();
        for (name, pin) in pins {
            if !seen.insert(pin) {
                return Err(DaemonError::Config(format!(
                    "GPIO {pin} assigned to {name} is already in use"
                )));
            }
        }

        let durations = [
            ("timing.debounce_ms", self.timing.debounce_ms),
            ("timing.double_click_ms", self.timing.double_click_ms),
            ("timing.long_press_ms", self.timing.long_press_ms),
            ("timing.driver_protect_ms", self.timing.driver_protect_ms),
            ("timing.pause_timeout_secs", self.timing.pause_timeout_secs),
            ("player.connect_timeout_secs", self.player.connect_timeout_secs),
            ("player.backoff_secs", self.player.backoff_secs),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, value)| *value == 0) {
            return Err(DaemonError::Config(format!("{name} must be greater than zero")));
        }

        if self.player.connect_attempts == 0 {
            return Err(DaemonError::Config(
                "player.connect_attempts must be at least 1".to_string(),
            ));
        }

        if self.player.host.trim().is_empty() {
            return Err(DaemonError::Config("player.host is required".to_string()));
        }

        Ok(())
    }
}

impl TimingSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn input(&self) -> InputTiming {
        InputTiming {
            double_click: Duration::from_millis(self.double_click_ms),
            long_press: Duration::from_millis(self.long_press_ms),
        }
    }

    pub fn amplifier(&self) -> AmpTiming {
        AmpTiming {
            driver_protect: Duration::from_millis(self.driver_protect_ms),
            pause_timeout: Duration::from_secs(self.pause_timeout_secs),
        }
    }
}

impl PlayerSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            connect_attempts: self.connect_attempts,
            backoff: Duration::from_secs(self.backoff_secs),
            ..RetryPolicy::default()
        }
    }
}

// Default values
fn default_gpio_path() -> PathBuf {
    PathBuf::from(DEFAULT_SYSFS_ROOT)
}

fn default_timing() -> TimingSettings {
    TimingSettings {
        debounce_ms: default_debounce_ms(),
        double_click_ms: default_double_click_ms(),
        long_press_ms: default_long_press_ms(),
        driver_protect_ms: default_driver_protect_ms(),
        pause_timeout_secs: default_pause_timeout_secs(),
    }
}

fn default_debounce_ms() -> u64 {
    50
}

fn default_double_click_ms() -> u64 {
    300
}

fn default_long_press_ms() -> u64 {
    1000
}

fn default_driver_protect_ms() -> u64 {
    1500
}

fn default_pause_timeout_secs() -> u64 {
    300
}

fn default_player() -> PlayerSettings {
    PlayerSettings {
        host: default_host(),
        port: default_port(),
        connect_timeout_secs: default_connect_timeout_secs(),
        connect_attempts: default_connect_attempts(),
        backoff_secs: default_backoff_secs(),
        restart_command: default_restart_command(),
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6600
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_connect_attempts() -> u32 {
    5
}

fn default_backoff_secs() -> u64 {
    2
}

fn default_restart_command() -> String {
    "service mpd restart".to_string()
}
