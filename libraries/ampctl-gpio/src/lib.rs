//! ampctl GPIO
//!
//! Digital lines exposed through the Linux sysfs GPIO interface
//! (`/sys/class/gpio`). A line is exported, given a direction and, for inputs,
//! an edge mode; its `value` attribute is then held open for the lifetime of the
//! returned handle.
//!
//! - [`SysfsOutput`] drives a relay and implements [`ampctl_core::OutputLine`].
//! - [`InputLine`] samples a switch or encoder phase.
//! - [`EdgeInput`] additionally waits for edge notifications through the tokio
//!   reactor, so several lines can be multiplexed with `tokio::select!`.
//!
//! # Example
//!
//! ```rust,no_run
//! use ampctl_gpio::{Edge, SysfsGpio};
//! use ampctl_core::{Level, OutputLine};
//!
//! # async fn run() -> ampctl_gpio::Result<()> {
//! let gpio = SysfsGpio::new("/sys/class/gpio");
//!
//! let mut relay = gpio.open_output(20)?;
//! relay.write_level(Level::High).ok();
//!
//! let button = gpio.open_input(75, Edge::Both)?.watch()?;
//! button.wait_edge().await?;
//! let level = button.read_level()?;
//! # let _ = level;
//! # Ok(())
//! # }
//! ```

mod error;
mod sysfs;

pub use error::{GpioError, Result};
pub use sysfs::{Direction, Edge, EdgeInput, InputLine, SysfsGpio, SysfsOutput, DEFAULT_SYSFS_ROOT};
