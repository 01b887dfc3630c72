//! Error types for sysfs line access

use ampctl_core::CoreError;
use thiserror::Error;

/// GPIO errors
#[derive(Debug, Error)]
pub enum GpioError {
    /// Writing the pin number to the export attribute failed
    #[error("GPIO {pin}: export failed: {source}")]
    Export {
        pin: u32,
        #[source]
        source: std::io::Error,
    },

    /// Writing a configuration attribute (direction, edge) failed
    #[error("GPIO {pin}: cannot set {attribute}: {source}")]
    Attribute {
        pin: u32,
        attribute: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The value attribute could not be opened
    #[error("GPIO {pin}: cannot open value: {source}")]
    Open {
        pin: u32,
        #[source]
        source: std::io::Error,
    },

    /// Sampling the line failed
    #[error("GPIO {pin}: read failed: {source}")]
    Read {
        pin: u32,
        #[source]
        source: std::io::Error,
    },

    /// The value attribute was empty
    #[error("GPIO {pin}: value attribute is empty")]
    EmptyValue { pin: u32 },

    /// Driving the line failed
    #[error("GPIO {pin}: write failed: {source}")]
    Write {
        pin: u32,
        #[source]
        source: std::io::Error,
    },

    /// Registering or waiting for edge notifications failed
    #[error("GPIO {pin}: edge wait failed: {source}")]
    Watch {
        pin: u32,
        #[source]
        source: std::io::Error,
    },
}

impl GpioError {
    /// Pin the error refers to
    pub fn pin(&self) -> u32 {
        match self {
            Self::Export { pin, .. }
            | Self::Attribute { pin, .. }
            | Self::Open { pin, .. }
            | Self::Read { pin, .. }
            | Self::EmptyValue { pin }
            | Self::Write { pin, .. }
            | Self::Watch { pin, .. } => *pin,
        }
    }
}

impl From<GpioError> for CoreError {
    fn from(err: GpioError) -> Self {
        CoreError::line_write(err.pin(), err.to_string())
    }
}

/// Result type for GPIO operations
pub type Result<T> = std::result::Result<T, GpioError>;
