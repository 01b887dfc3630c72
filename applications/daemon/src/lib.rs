//! Amplifier controller daemon
//!
//! Wires the GPIO lines, the gesture decoder, the amplifier state machine and
//! the MPD link into one worker, and keeps that worker alive from a
//! supervising parent process.

pub mod config;
pub mod error;
pub mod logging;
pub mod supervisor;
pub mod worker;

pub use config::AmpConfig;
pub use error::{DaemonError, Result};
pub use logging::Verbosity;
pub use supervisor::{Launcher, ProcessLauncher, Supervisor};
