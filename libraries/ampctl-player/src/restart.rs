//! Service restart through a shell command

use crate::error::{PlayerError, Result};
use crate::traits::ServiceRestarter;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

/// Restarts the player by running a shell command such as `service mpd restart`
#[derive(Debug, Clone)]
pub struct ShellRestarter {
    command: String,
}

impl ShellRestarter {
    /// Create a restarter, or `None` when `command` is blank
    pub fn from_command(command: &str) -> Option<Self> {
        let command = command.trim();
        if command.is_empty() {
            None
        } else {
            Some(Self {
                command: command.to_string(),
            })
        }
    }

    /// The configured command line
    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl ServiceRestarter for ShellRestarter {
    async fn restart(&self) -> Result<()> {
        info!(command = %self.command, "Restarting player service");

        let status = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .status()
            .await
            .map_err(|e| PlayerError::Restart(format!("{}: {e}", self.command)))?;

        if status.success() {
            Ok(())
        } else {
            Err(PlayerError::Restart(format!("{} exited with {status}", self.command)))
        }
    }
}
