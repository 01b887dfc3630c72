//! Seams between the escalation ladder and the outside world.

use crate::error::Result;
use ampctl_core::{PlayerCommand, PlayerState};
use async_trait::async_trait;

/// An open connection to the player
#[async_trait]
pub trait PlayerConnection: Send {
    /// Execute one command and wait for its acknowledgement
    async fn run_command(&mut self, command: PlayerCommand) -> Result<()>;

    /// Query the current playback state
    async fn current_state(&mut self) -> Result<PlayerState>;

    /// Block until the playback state changes, then report the new state
    async fn wait_state_change(&mut self) -> Result<PlayerState>;
}

/// Opens fresh player connections
#[async_trait]
pub trait PlayerConnector: Send + Sync {
    /// Open a new connection
    async fn connect(&self) -> Result<Box<dyn PlayerConnection>>;
}

/// Process-level recovery action used as the last rung of the ladder
#[async_trait]
pub trait ServiceRestarter: Send + Sync {
    /// Restart the player service
    async fn restart(&self) -> Result<()>;
}
