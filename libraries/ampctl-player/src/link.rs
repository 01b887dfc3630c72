//! Player link with reconnection and escalation
//!
//! A link owns at most one live connection. When an operation fails on a
//! transport error the link walks the escalation ladder:
//!
//! 1. a round of up to `connect_attempts` immediate reconnection attempts
//! 2. wait `backoff`, then another round
//! 3. run the service restarter (if any), then a final round
//!
//! If the last round fails the link reports [`PlayerError::Unreachable`],
//! which the worker treats as fatal.

use crate::error::{PlayerError, Result};
use crate::traits::{PlayerConnection, PlayerConnector, ServiceRestarter};
use ampctl_core::{PlayerCommand, PlayerState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Retry and escalation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Connection attempts per reconnection round
    pub connect_attempts: u32,
    /// Wait between the first and second round
    pub backoff: Duration,
    /// How often one command is tried before it is given up
    pub max_command_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            connect_attempts: 5,
            backoff: Duration::from_secs(2),
            max_command_attempts: 3,
        }
    }
}

enum Operation {
    Command(PlayerCommand),
    Status,
    Idle,
}

/// Self-healing connection to the player
pub struct PlayerLink {
    name: &'static str,
    connector: Arc<dyn PlayerConnector>,
    restarter: Option<Arc<dyn ServiceRestarter>>,
    policy: RetryPolicy,
    connection: Option<Box<dyn PlayerConnection>>,
    error_count: u64,
}

impl PlayerLink {
    /// Create a disconnected link
    ///
    /// `name` tags log messages so the command and listener links can be told
    /// apart.
    pub fn new(
        name: &'static str,
        connector: Arc<dyn PlayerConnector>,
        restarter: Option<Arc<dyn ServiceRestarter>>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            name,
            connector,
            restarter,
            policy,
            connection: None,
            error_count: 0,
        }
    }

    /// Whether a connection is currently held
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Number of failed operations seen since creation
    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    /// Connect if not already connected, escalating on failure
    pub async fn ensure_connected(&mut self) -> Result<()> {
        if self.connection.is_none() {
            self.recover().await?;
        }
        Ok(())
    }

    /// Execute one command
    ///
    /// Transport failures trigger recovery and a retry; after
    /// `max_command_attempts` the command is dropped with a non-fatal error.
    /// A rejected command is reported without touching the connection.
    pub async fn execute(&mut self, command: PlayerCommand) -> Result<()> {
        self.perform(Operation::Command(command), Some(self.policy.max_command_attempts))
            .await
            .map(|_| ())
    }

    /// Query the current playback state
    pub async fn current_state(&mut self) -> Result<PlayerState> {
        let state = self
            .perform(Operation::Status, Some(self.policy.max_command_attempts))
            .await?;
        state.ok_or_else(|| PlayerError::Protocol("status returned no state".to_string()))
    }

    /// Wait for the next playback state change
    ///
    /// Recovers from any number of transport failures; only an exhausted
    /// ladder ends the wait with an error.
    pub async fn next_state_change(&mut self) -> Result<PlayerState> {
        let state = self.perform(Operation::Idle, None).await?;
        state.ok_or_else(|| PlayerError::Protocol("idle returned no state".to_string()))
    }

    async fn perform(
        &mut self,
        operation: Operation,
        max_attempts: Option<u32>,
    ) -> Result<Option<PlayerState>> {
        let mut attempts = 0u32;
        loop {
            let Some(connection) = self.connection.as_mut() else {
                self.recover().await?;
                continue;
            };

            let result = match &operation {
                Operation::Command(command) => {
                    connection.run_command(*command).await.map(|()| None)
                }
                Operation::Status => connection.current_state().await.map(Some),
                Operation::Idle => connection.wait_state_change().await.map(Some),
            };

            match result {
                Ok(state) => return Ok(state),
                Err(err) if !err.is_transport() => {
                    self.error_count += 1;
                    return Err(err);
                }
                Err(err) => {
                    self.error_count += 1;
                    attempts += 1;
                    warn!(link = self.name, error = %err, attempts, "Player operation failed");

                    if max_attempts.is_some_and(|max| attempts >= max) {
                        self.connection = None;
                        return Err(err);
                    }
                    self.recover().await?;
                }
            }
        }
    }

    /// Replace the connection, walking the escalation ladder
    pub async fn recover(&mut self) -> Result<()> {
        self.connection = None;

        if self.reconnect_round().await {
            return Ok(());
        }

        error!(
            link = self.name,
            backoff_ms = self.policy.backoff.as_millis() as u64,
            "Player unreachable, backing off"
        );
        tokio::time::sleep(self.policy.backoff).await;
        if self.reconnect_round().await {
            return Ok(());
        }

        let mut rounds = 2;
        if let Some(restarter) = self.restarter.clone() {
            error!(link = self.name, "Player still unreachable, restarting service");
            if let Err(err) = restarter.restart().await {
                error!(link = self.name, error = %err, "Service restart failed");
            }
            rounds += 1;
            if self.reconnect_round().await {
                return Ok(());
            }
        }

        error!(link = self.name, "Giving up on player");
        Err(PlayerError::Unreachable {
            attempts: rounds * self.policy.connect_attempts,
        })
    }

    async fn reconnect_round(&mut self) -> bool {
        for attempt in 1..=self.policy.connect_attempts {
            match self.connector.connect().await {
                Ok(connection) => {
                    self.connection = Some(connection);
                    if attempt > 1 || self.error_count > 0 {
                        info!(link = self.name, attempt, "Reconnected to player");
                    } else {
                        debug!(link = self.name, "Connected to player");
                    }
                    return true;
                }
                Err(err) => {
                    warn!(link = self.name, attempt, error = %err, "Connection attempt failed");
                }
            }
        }
        false
    }
}

impl std::fmt::Debug for PlayerLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerLink")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("connected", &self.connection.is_some())
            .field("error_count", &self.error_count)
            .finish_non_exhaustive()
    }
}
