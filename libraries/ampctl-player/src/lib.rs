//! ampctl-player - MPD link for the amplifier controller
//!
//! Talks to a Music Player Daemon over its text protocol. Two independent
//! connections are used: one executes transport commands, the other waits for
//! playback state changes. Both heal themselves through [`PlayerLink`], which
//! reconnects, backs off and finally restarts the player service before
//! declaring the player unreachable.
//!
//! # Example
//!
//! ```rust,no_run
//! use ampctl_player::{MpdConnector, PlayerLink, RetryPolicy, ShellRestarter};
//! use ampctl_core::PlayerCommand;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> ampctl_player::Result<()> {
//! let connector = Arc::new(MpdConnector::new("localhost", 6600, Duration::from_secs(30)));
//! let restarter = ShellRestarter::from_command("service mpd restart")
//!     .map(|r| Arc::new(r) as Arc<dyn ampctl_player::ServiceRestarter>);
//!
//! let mut link = PlayerLink::new("commands", connector, restarter, RetryPolicy::default());
//! link.execute(PlayerCommand::Play).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod link;
pub mod mpd;
pub mod restart;
pub mod tasks;
pub mod traits;

pub use error::{PlayerError, Result};
pub use link::{PlayerLink, RetryPolicy};
pub use mpd::{MpdConnection, MpdConnector};
pub use restart::ShellRestarter;
pub use tasks::{run_commands, run_listener};
pub use traits::{PlayerConnection, PlayerConnector, ServiceRestarter};
