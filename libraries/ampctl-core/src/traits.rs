/// Core traits for ampctl
use crate::error::Result;
use crate::types::Level;

/// A digital output line driving a relay
///
/// Implementers own the underlying handle exclusively; the line is released when
/// the implementer is dropped.
pub trait OutputLine: Send {
    /// Drive the line to `level`
    ///
    /// # Errors
    /// Returns an error if the level could not be written to the hardware
    fn write_level(&mut self, level: Level) -> Result<()>;
}

impl<T: OutputLine + ?Sized> OutputLine for Box<T> {
    fn write_level(&mut self, level: Level) -> Result<()> {
        (**self).write_level(level)
    }
}
