//! Bridge configuration

use std::time::Duration;

use rc5_protocol::{GpioPin, CAMBRIDGE_AUDIO_SYSTEM};
use serde::{Deserialize, Serialize};

/// Which mute key event toggles the amplifier mute
///
/// Adapter firmware differs on whether the TV's mute arrives as a press or a
/// release, so this is selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuteTrigger {
    /// `key pressed: mute (43)`
    Pressed,
    /// `key released: mute (43)`
    #[default]
    Released,
}

/// Bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// BCM GPIO number driving the IR emitter / amplifier control input
    pub gpio_pin: u8,
    /// RC-5 system id of the amplifier
    pub system_id: u8,
    /// Half-bit period in microseconds
    pub half_bit_us: u32,
    /// Transmissions per volume key press
    pub volume_steps: u32,
    /// Transmissions per power command
    pub power_repeat: u32,
    /// Wait after a power-on report before commanding the amplifier (ms)
    pub settle_delay_ms: u64,
    /// Gap between repeated transmissions (ms)
    pub repeat_pacing_ms: u64,
    /// Hardware busy poll interval (ms)
    pub idle_poll_ms: u64,
    /// Mute key event that toggles mute
    pub mute_trigger: MuteTrigger,
    /// Volume level reported once the adapter handshake completes
    pub baseline_volume: u8,
    /// Volume level reported after a volume-up key
    pub volume_up_level: u8,
    /// Volume level reported after a volume-down key
    pub volume_down_level: u8,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            gpio_pin: 4,
            system_id: CAMBRIDGE_AUDIO_SYSTEM,
            half_bit_us: 889,
            volume_steps: 4,
            power_repeat: 4,
            settle_delay_ms: 5000,
            repeat_pacing_ms: 100,
            idle_poll_ms: 5,
            mute_trigger: MuteTrigger::default(),
            baseline_volume: 8,
            volume_up_level: 16,
            volume_down_level: 4,
        }
    }
}

impl BridgeConfig {
    /// Output pin
    pub fn pin(&self) -> GpioPin {
        GpioPin::new(self.gpio_pin)
    }

    /// Half-bit period
    pub fn half_bit(&self) -> Duration {
        Duration::from_micros(self.half_bit_us as u64)
    }

    /// Settle delay after power-on
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Gap between repeated transmissions
    pub fn repeat_pacing(&self) -> Duration {
        Duration::from_millis(self.repeat_pacing_ms)
    }

    /// Busy poll interval
    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.pin().mask(), 1 << 4);
        assert_eq!(config.half_bit(), Duration::from_micros(889));
        assert_eq!(config.settle_delay(), Duration::from_secs(5));
        assert_eq!(config.repeat_pacing(), Duration::from_millis(100));
        assert_eq!(config.system_id, 16);
        assert_eq!(config.mute_trigger, MuteTrigger::Released);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{"gpio_pin": 17, "mute_trigger": "pressed"}"#).unwrap();
        assert_eq!(config.gpio_pin, 17);
        assert_eq!(config.mute_trigger, MuteTrigger::Pressed);
        assert_eq!(config.volume_steps, 4);
    }
}
