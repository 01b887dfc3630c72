//! Error types for the player link.

use thiserror::Error;

/// Errors that can occur when talking to the player.
#[derive(Error, Debug)]
pub enum PlayerError {
    /// TCP-level failure (connect refused, reset, broken pipe)
    #[error("Connection error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection attempt exceeded the configured timeout
    #[error("Connection to {address} timed out")]
    Timeout {
        /// `host:port` that did not answer
        address: String,
    },

    /// The player closed the connection
    #[error("Connection closed by player")]
    Closed,

    /// The player sent something that is not valid protocol
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The player rejected a command
    #[error("Command rejected: {0}")]
    Ack(String),

    /// The service restart action failed
    #[error("Service restart failed: {0}")]
    Restart(String),

    /// Every step of the escalation ladder failed
    #[error("Player unreachable after {attempts} connection attempts")]
    Unreachable {
        /// Connection attempts made across all rounds
        attempts: u32,
    },
}

impl PlayerError {
    /// Whether the worker must terminate on this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }

    /// Whether the connection that produced this error must be replaced
    ///
    /// A rejected command leaves the connection healthy.
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::Ack(_) | Self::Unreachable { .. } | Self::Restart(_))
    }
}

/// Result type for player operations.
pub type Result<T> = std::result::Result<T, PlayerError>;
