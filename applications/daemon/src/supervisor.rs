/// Crash-isolating supervisor
///
/// The supervisor launches the worker as a separate process, waits for it to
/// exit and launches a new one straight away. There is no backoff and no
/// respawn limit; only a failure to launch ends the loop.
use crate::error::{DaemonError, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitStatus;
use tokio::process::Command;
use tracing::{error, info, warn};

/// Starts one worker and waits for it to finish
#[async_trait]
pub trait Launcher: Send {
    async fn launch(&mut self) -> Result<ExitStatus>;
}

/// Re-executes a binary with the hidden `worker` subcommand
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ProcessLauncher {
    pub fn new(program: impl Into<PathBuf>, args: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Launcher for the running executable
    pub fn current_exe(args: Vec<OsString>) -> Result<Self> {
        let program = std::env::current_exe()
            .map_err(|e| DaemonError::Spawn(format!("cannot locate own executable: {e}")))?;
        Ok(Self::new(program, args))
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(&mut self) -> Result<ExitStatus> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DaemonError::Spawn(format!("{}: {e}", self.program.display())))?;

        info!(pid = child.id(), "Worker started");
        Ok(child.wait().await?)
    }
}

/// Respawn loop around a [`Launcher`]
pub struct Supervisor<L: Launcher> {
    launcher: L,
    launches: u64,
}

impl<L: Launcher> Supervisor<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            launches: 0,
        }
    }

    /// Number of workers launched so far
    pub fn launches(&self) -> u64 {
        self.launches
    }

    /// Run one worker to completion
    pub async fn run_once(&mut self) -> Result<ExitStatus> {
        self.launches += 1;
        let status = self.launcher.launch().await?;

        if status.success() {
            warn!(launch = self.launches, "Worker exited cleanly, restarting");
        } else {
            error!(launch = self.launches, %status, "Worker died, restarting");
        }
        Ok(status)
    }

    /// Respawn workers forever; returns only when a launch fails
    pub async fn run(&mut self) -> Result<()> {
        info!("Supervisor started");
        loop {
            self.run_once().await?;
        }
    }
}
