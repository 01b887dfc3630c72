/// Tracing subscriber setup
use crate::error::{DaemonError, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Verbosity selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Quiet,
    Verbose,
    Debug,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, debug: bool) -> Self {
        if debug {
            Self::Debug
        } else if verbose {
            Self::Verbose
        } else {
            Self::Quiet
        }
    }

    /// Filter used when `RUST_LOG` is not set
    pub fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Verbose => "warn,ampctl=info",
            Self::Debug => "info,ampctl=debug",
        }
    }
}

/// Install the global subscriber
///
/// Logs go to `file` (appended, no colours) when given, stdout otherwise.
pub fn init(verbosity: Verbosity, file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false),
                )
                .try_init()
        }
        None => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    installed.map_err(|e| DaemonError::Logging(e.to_string()))
}
