//! ampctl-control - the event-correlation core
//!
//! - [`GestureDecoder`]: debounced button and quadrature encoder decoding
//! - [`InputHandler`]: resolves gestures into events, running the
//!   double-click and long-press timers
//! - [`Amplifier`] and [`run_dispatcher`]: the serialized power/mute state
//!   machine with its pause-timeout and driver-protect timers
//! - [`TimerSlot`]: replaceable one-shot timer with stale-fire protection
//!
//! # Example
//!
//! ```rust,no_run
//! use ampctl_control::{AmpChannels, AmpTiming, Amplifier, run_dispatcher};
//! use ampctl_core::{AmpStatus, Level, OutputLine};
//! use tokio::sync::{mpsc, watch};
//!
//! struct Relay;
//! impl OutputLine for Relay {
//!     fn write_level(&mut self, _level: Level) -> ampctl_core::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() {
//! let (events_tx, events_rx) = mpsc::unbounded_channel();
//! let (commands_tx, _commands_rx) = mpsc::unbounded_channel();
//! let (status_tx, _status_rx) = watch::channel(AmpStatus::default());
//!
//! let amplifier = Amplifier::new(
//!     Relay,
//!     Relay,
//!     AmpTiming::default(),
//!     AmpChannels { events: events_tx, commands: commands_tx, status: status_tx },
//! );
//! tokio::spawn(run_dispatcher(amplifier, events_rx));
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amplifier;
pub mod error;
pub mod gesture;
pub mod input;
pub mod timer;

pub use amplifier::{run_dispatcher, AmpChannels, AmpTiming, Amplifier};
pub use error::{ControlError, Result};
pub use gesture::{Gesture, GestureDecoder};
pub use input::{InputHandler, InputTiming};
pub use timer::TimerSlot;
