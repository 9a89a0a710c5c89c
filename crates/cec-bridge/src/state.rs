//! Amplifier state tracking and outbound feedback frames

use serde::{Deserialize, Serialize};

/// Amplifier power as last commanded by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AmpPower {
    /// Nothing commanded yet
    #[default]
    Unknown,
    /// `ampoff` sent
    Standby,
    /// `ampon` sent
    PoweredOn,
}

/// State the bridge believes the amplifier is in
///
/// There is no return channel from the amplifier, so this only reflects
/// what was transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceState {
    /// Power state
    pub amp_power: AmpPower,
    /// Mute state
    pub muted: bool,
}

impl DeviceState {
    /// Create the startup state
    pub fn new() -> Self {
        Self::default()
    }
}

/// Frame written back to the adapter's stdin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// Report Audio Status (`50:7a`) with a volume level
    VolumeLevel(u8),
    /// Set System Audio Mode on (`50:72:01`), silencing the TV speakers
    AudioSystemActive,
}

impl Feedback {
    /// `cec-client` transmit command for this frame
    pub fn frame(&self) -> String {
        match self {
            Feedback::VolumeLevel(level) => format!("tx 50:7a:{:02x}", level),
            Feedback::AudioSystemActive => "tx 50:72:01".to_string(),
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = DeviceState::new();
        assert_eq!(state.amp_power, AmpPower::Unknown);
        assert!(!state.muted);
    }

    #[test]
    fn test_feedback_frames() {
        assert_eq!(Feedback::VolumeLevel(8).frame(), "tx 50:7a:08");
        assert_eq!(Feedback::VolumeLevel(16).frame(), "tx 50:7a:10");
        assert_eq!(Feedback::VolumeLevel(4).frame(), "tx 50:7a:04");
        assert_eq!(Feedback::AudioSystemActive.to_string(), "tx 50:72:01");
    }
}
