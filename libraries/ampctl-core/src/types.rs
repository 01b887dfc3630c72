//! Domain types shared by the gesture decoder, the dispatcher and the player link

use serde::{Deserialize, Serialize};

/// Logic level of a digital line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Logic 0
    Low,
    /// Logic 1
    High,
}

impl Level {
    /// Interpret the first byte of a sysfs `value` attribute
    pub fn from_ascii(byte: u8) -> Self {
        if byte == b'0' {
            Self::Low
        } else {
            Self::High
        }
    }

    /// Bit value of the level
    pub fn bit(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        if value {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl From<Level> for bool {
    fn from(value: Level) -> Self {
        matches!(value, Level::High)
    }
}

/// Amplifier power relay state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerState {
    /// Amplifier switched off
    Off,
    /// Amplifier powered
    On,
}

impl PowerState {
    /// Level the power relay line must carry for this state
    pub fn relay_level(self) -> Level {
        match self {
            Self::Off => Level::Low,
            Self::On => Level::High,
        }
    }

    /// Whether the amplifier is powered
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

/// Speaker mute relay state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MuteState {
    /// Speakers disconnected
    Muted,
    /// Speakers connected
    Unmuted,
}

impl MuteState {
    /// Level the mute relay line must carry for this state
    ///
    /// The mute relay is active-low: muting pulls the line to ground.
    pub fn relay_level(self) -> Level {
        match self {
            Self::Muted => Level::Low,
            Self::Unmuted => Level::High,
        }
    }

    /// The opposite state
    pub fn toggled(self) -> Self {
        match self {
            Self::Muted => Self::Unmuted,
            Self::Unmuted => Self::Muted,
        }
    }

    /// Whether the speakers are disconnected
    pub fn is_muted(self) -> bool {
        matches!(self, Self::Muted)
    }
}

/// Snapshot of the amplifier published after every dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmpStatus {
    /// Power relay state
    pub power: PowerState,
    /// Mute relay state
    pub mute: MuteState,
}

impl Default for AmpStatus {
    fn default() -> Self {
        Self {
            power: PowerState::Off,
            mute: MuteState::Muted,
        }
    }
}

/// Playback state reported by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerState {
    /// Audio is playing
    Playing,
    /// Playback paused mid-track
    Paused,
    /// Nothing playing
    Stopped,
}

/// Command sent to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerCommand {
    /// Stop playback
    Stop,
    /// Start or resume playback
    Play,
    /// Pause (`true`) or resume (`false`)
    Pause(bool),
    /// Relative volume change in percent
    ChangeVolume(i32),
    /// Skip to the next track in the queue
    NextTrack,
}

/// Event processed by the amplifier dispatcher
///
/// One event is one case of the transition table; the payload, if any, is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmpEvent {
    /// Button pressed while the amplifier was off
    SwitchOn,
    /// Switch the amplifier off and stop the player
    SwitchOff,
    /// Mute the speakers and pause the player
    MuteOn,
    /// Unmute the speakers and resume the player
    MuteOff,
    /// Single click resolved: flip the mute state
    MuteToggle,
    /// Encoder rotated by the given number of detents
    RotateVolume(i32),
    /// Player started playing
    PlayerPlaying,
    /// Player paused
    PlayerPaused,
    /// Player stopped
    PlayerStopped,
    /// The amplifier stayed muted for the whole pause timeout
    PauseTimeoutFired,
    /// The output driver settled after power-on
    DriverProtectElapsed,
    /// Button held for the long-press interval
    LongPress,
    /// Second press inside the double-click window
    DoubleClick,
}

impl From<PlayerState> for AmpEvent {
    fn from(state: PlayerState) -> Self {
        match state {
            PlayerState::Playing => AmpEvent::PlayerPlaying,
            PlayerState::Paused => AmpEvent::PlayerPaused,
            PlayerState::Stopped => AmpEvent::PlayerStopped,
        }
    }
}
