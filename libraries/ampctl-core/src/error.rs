/// Core error types for ampctl
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for ampctl
#[derive(Error, Debug)]
pub enum CoreError {
    /// A digital line could not be driven
    #[error("Line {pin} write failed: {message}")]
    LineWrite {
        /// Pin number of the line
        pin: u32,
        /// Underlying failure
        message: String,
    },

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Create a line write error
    pub fn line_write(pin: u32, msg: impl Into<String>) -> Self {
        Self::LineWrite {
            pin,
            message: msg.into(),
        }
    }
}
