//! Long-running player tasks
//!
//! The worker runs two links: one drains the command queue in dispatch order,
//! the other blocks in `idle` and forwards state changes to the dispatcher.

use crate::error::Result;
use crate::link::PlayerLink;
use ampctl_core::{AmpEvent, PlayerCommand};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

/// Execute queued commands until the queue closes or the player is lost
///
/// Commands that fail after their retries are logged and dropped. An
/// exhausted escalation ladder ends the task with the fatal error.
pub async fn run_commands(
    mut link: PlayerLink,
    mut commands: UnboundedReceiver<PlayerCommand>,
) -> Result<()> {
    link.ensure_connected().await?;
    info!("Command link ready");

    while let Some(command) = commands.recv().await {
        debug!(?command, "Executing player command");
        match link.execute(command).await {
            Ok(()) => {}
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => error!(?command, error = %err, "Player command dropped"),
        }
    }

    debug!("Command queue closed");
    Ok(())
}

/// Forward player state changes as events
///
/// The current state is reported once on start so the amplifier matches a
/// player that was already playing.
pub async fn run_listener(mut link: PlayerLink, events: UnboundedSender<AmpEvent>) -> Result<()> {
    match link.current_state().await {
        Ok(initial) => {
            info!(state = ?initial, "Listener link ready");
            if events.send(initial.into()).is_err() {
                return Ok(());
            }
        }
        Err(err) if err.is_fatal() => return Err(err),
        Err(err) => warn!(error = %err, "Initial player state unavailable"),
    }

    loop {
        let state = link.next_state_change().await?;
        debug!(?state, "Player state changed");
        if events.send(state.into()).is_err() {
            debug!("Event queue closed");
            return Ok(());
        }
    }
}
