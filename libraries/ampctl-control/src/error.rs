//! Error types for the control core

use thiserror::Error;

/// Errors raised by the input handler and the dispatcher
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The dispatcher is gone; gestures can no longer be delivered
    #[error("Event queue closed")]
    EventQueueClosed,

    /// The command task is gone; player commands can no longer be issued
    #[error("Player command queue closed")]
    CommandQueueClosed,
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
