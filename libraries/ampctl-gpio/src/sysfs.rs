//! sysfs GPIO access
//!
//! Layout under the root directory:
//!
//! | Path                 | Purpose                                   |
//! |----------------------|-------------------------------------------|
//! | `export`             | write a pin number to create `gpio<N>/`   |
//! | `gpio<N>/direction`  | `in` or `out`                             |
//! | `gpio<N>/edge`       | `none`, `rising`, `falling` or `both`     |
//! | `gpio<N>/value`      | `0` or `1`; raises `POLLPRI` on edges     |

use crate::error::{GpioError, Result};
use ampctl_core::{Level, OutputLine};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tracing::{debug, trace};

/// Default location of the sysfs GPIO class
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";

/// Line direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Input line
    In,
    /// Output line
    Out,
}

impl Direction {
    fn as_sysfs(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

/// Edges that raise a notification on an input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// No notification
    None,
    /// Low to high
    Rising,
    /// High to low
    Falling,
    /// Both transitions
    Both,
}

impl Edge {
    fn as_sysfs(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Both => "both",
        }
    }
}

/// Handle on a sysfs GPIO class directory
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    root: PathBuf,
}

impl SysfsGpio {
    /// Create a handle rooted at `root` (normally [`DEFAULT_SYSFS_ROOT`])
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the GPIO class
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pin_dir(&self, pin: u32) -> PathBuf {
        self.root.join(format!("gpio{pin}"))
    }

    /// Export `pin` to user space
    ///
    /// Already-exported pins are left untouched.
    pub fn export(&self, pin: u32) -> Result<()> {
        if self.pin_dir(pin).is_dir() {
            trace!(pin, "GPIO already exported");
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .write(true)
            .open(self.root.join("export"))
            .map_err(|source| GpioError::Export { pin, source })?;
        file.write_all(pin.to_string().as_bytes())
            .map_err(|source| GpioError::Export { pin, source })?;

        debug!(pin, "GPIO exported");
        Ok(())
    }

    /// Set the direction of an exported pin
    pub fn set_direction(&self, pin: u32, direction: Direction) -> Result<()> {
        self.write_attribute(pin, "direction", direction.as_sysfs())
    }

    /// Set the edge mode of an exported input pin
    pub fn set_edge(&self, pin: u32, edge: Edge) -> Result<()> {
        self.write_attribute(pin, "edge", edge.as_sysfs())
    }

    fn write_attribute(&self, pin: u32, attribute: &'static str, value: &str) -> Result<()> {
        let path = self.pin_dir(pin).join(attribute);
        let mut file = OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(|source| GpioError::Attribute {
                pin,
                attribute,
                source,
            })?;
        file.write_all(value.as_bytes())
            .map_err(|source| GpioError::Attribute {
                pin,
                attribute,
                source,
            })
    }

    fn open_value(&self, pin: u32, write: bool) -> Result<File> {
        OpenOptions::new()
            .read(!write)
            .write(write)
            .open(self.pin_dir(pin).join("value"))
            .map_err(|source| GpioError::Open { pin, source })
    }

    /// Export `pin`, configure it as an output and open it for writing
    pub fn open_output(&self, pin: u32) -> Result<SysfsOutput> {
        self.export(pin)?;
        self.set_direction(pin, Direction::Out)?;
        let file = self.open_value(pin, true)?;
        debug!(pin, "Output line opened");
        Ok(SysfsOutput { pin, file })
    }

    /// Export `pin`, configure it as an input with the given edge mode and open it
    pub fn open_input(&self, pin: u32, edge: Edge) -> Result<InputLine> {
        self.export(pin)?;
        self.set_direction(pin, Direction::In)?;
        if edge != Edge::None {
            self.set_edge(pin, edge)?;
        }
        let file = self.open_value(pin, false)?;
        debug!(pin, edge = edge.as_sysfs(), "Input line opened");
        Ok(InputLine { pin, file })
    }
}

fn read_level(pin: u32, mut file: &File) -> Result<Level> {
    file.seek(SeekFrom::Start(0))
        .map_err(|source| GpioError::Read { pin, source })?;
    let mut buf = [0u8; 1];
    let n = file
        .read(&mut buf)
        .map_err(|source| GpioError::Read { pin, source })?;
    if n == 0 {
        return Err(GpioError::EmptyValue { pin });
    }
    Ok(Level::from_ascii(buf[0]))
}

/// Output line driving a relay
#[derive(Debug)]
pub struct SysfsOutput {
    pin: u32,
    file: File,
}

impl SysfsOutput {
    /// Pin number of the line
    pub fn pin(&self) -> u32 {
        self.pin
    }

    /// Drive the line to `level`
    pub fn set_level(&mut self, level: Level) -> Result<()> {
        let pin = self.pin;
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|source| GpioError::Write { pin, source })?;
        let byte = if bool::from(level) { b"1" } else { b"0" };
        self.file
            .write_all(byte)
            .map_err(|source| GpioError::Write { pin, source })?;
        trace!(pin, level = level.bit(), "Line written");
        Ok(())
    }
}

impl OutputLine for SysfsOutput {
    fn write_level(&mut self, level: Level) -> ampctl_core::Result<()> {
        self.set_level(level).map_err(Into::into)
    }
}

/// Input line that can be sampled on demand
#[derive(Debug)]
pub struct InputLine {
    pin: u32,
    file: File,
}

impl InputLine {
    /// Pin number of the line
    pub fn pin(&self) -> u32 {
        self.pin
    }

    /// Sample the current level
    pub fn read_level(&self) -> Result<Level> {
        read_level(self.pin, &self.file)
    }

    /// Register the line with the tokio reactor for edge notifications
    ///
    /// Must be called from within a tokio runtime.
    pub fn watch(self) -> Result<EdgeInput> {
        let pin = self.pin;
        let fd = AsyncFd::with_interest(self.file, Interest::PRIORITY)
            .map_err(|source| GpioError::Watch { pin, source })?;
        Ok(EdgeInput { pin, fd })
    }
}

/// Input line registered for edge notifications
#[derive(Debug)]
pub struct EdgeInput {
    pin: u32,
    fd: AsyncFd<File>,
}

impl EdgeInput {
    /// Pin number of the line
    pub fn pin(&self) -> u32 {
        self.pin
    }

    /// Sample the current level
    ///
    /// Reading the value also re-arms the kernel notification.
    pub fn read_level(&self) -> Result<Level> {
        read_level(self.pin, self.fd.get_ref())
    }

    /// Wait until the kernel reports an edge on the line
    pub async fn wait_edge(&self) -> Result<()> {
        let pin = self.pin;
        let mut guard = self
            .fd
            .ready(Interest::PRIORITY)
            .await
            .map_err(|source| GpioError::Watch { pin, source })?;
        guard.clear_ready();
        Ok(())
    }
}
