//! ampctl Core
//!
//! Platform-agnostic types, traits, and error handling shared by every ampctl crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `PowerState`, `MuteState`, `PlayerState`, `PlayerCommand`, `AmpEvent`
//! - **Core Traits**: `OutputLine` (a relay driven by a digital line)
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use ampctl_core::{AmpEvent, Level, MuteState, PlayerState, PowerState};
//!
//! // The mute relay is active-low
//! assert_eq!(MuteState::Muted.relay_level(), Level::Low);
//! assert_eq!(PowerState::On.relay_level(), Level::High);
//!
//! // Player notifications map onto dispatcher events
//! assert_eq!(AmpEvent::from(PlayerState::Paused), AmpEvent::PlayerPaused);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use traits::OutputLine;
pub use types::{AmpEvent, AmpStatus, Level, MuteState, PlayerCommand, PlayerState, PowerState};
