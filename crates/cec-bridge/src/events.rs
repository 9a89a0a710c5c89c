//! Classification of `cec-client` output lines
//!
//! The adapter prints one human-readable line per CEC event, mixed with a
//! lot of diagnostics. Only a handful of fixed markers matter; they are
//! matched as literal substrings and everything else is [`BusEvent::Unrecognized`].
//!
//! Markers are checked in a fixed order. TV power reports also contain the
//! generic power-transition marker, so the TV marker must win.

/// TV power status report: `TV (0): power status changed from 'standby' to 'on'`
const TV_POWER: &str = "TV (0): power status changed";
/// Power transition of any other device
const DEVICE_POWER: &str = ": power status changed from";
/// Sent by the adapter at the end of the audio system handshake
const READY: &str = "audio status '7f'";
const VOLUME_UP: &str = "key pressed: volume up (41)";
const VOLUME_DOWN: &str = "key pressed: volume down (42)";
const MUTE_PRESSED: &str = "key pressed: mute (43)";
const MUTE_RELEASED: &str = "key released: mute (43)";

/// Device that reported a power status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerSource {
    /// The TV (logical address 0)
    Tv,
    /// Any other device on the bus
    OtherDevice,
}

/// Remote keys forwarded by the TV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CecKey {
    /// User control code 0x41
    VolumeUp,
    /// User control code 0x42
    VolumeDown,
    /// User control code 0x43
    Mute,
}

/// Typed event parsed from one adapter line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    /// Power status report with its final state
    PowerStatusChanged {
        /// Reporting device
        source: PowerSource,
        /// Final state, e.g. `on`, `standby`, `in transition from standby to on`
        state: String,
    },

    /// Another device moved between two power states
    PowerTransition {
        /// Previous state
        from: String,
        /// New state
        to: String,
    },

    /// Key pressed on the TV remote
    KeyPressed(CecKey),

    /// Key released on the TV remote
    KeyReleased(CecKey),

    /// Adapter finished its handshake and volume feedback may be sent
    ReadyForFeedback,

    /// Any other line
    Unrecognized,
}

impl BusEvent {
    /// Whether this event could change amplifier state
    pub fn is_recognized(&self) -> bool {
        !matches!(self, BusEvent::Unrecognized)
    }
}

/// Classify one adapter output line
pub fn classify(line: &str) -> BusEvent {
    if line.contains(TV_POWER) {
        BusEvent::PowerStatusChanged {
            source: PowerSource::Tv,
            state: trailing_quoted(line).to_string(),
        }
    } else if line.contains(DEVICE_POWER) {
        match power_transition(line) {
            Some((from, to)) => BusEvent::PowerTransition {
                from: from.to_string(),
                to: to.to_string(),
            },
            None => BusEvent::PowerStatusChanged {
                source: PowerSource::OtherDevice,
                state: trailing_quoted(line).to_string(),
            },
        }
    } else if line.contains(READY) {
        BusEvent::ReadyForFeedback
    } else if line.contains(VOLUME_UP) {
        BusEvent::KeyPressed(CecKey::VolumeUp)
    } else if line.contains(VOLUME_DOWN) {
        BusEvent::KeyPressed(CecKey::VolumeDown)
    } else if line.contains(MUTE_PRESSED) {
        BusEvent::KeyPressed(CecKey::Mute)
    } else if line.contains(MUTE_RELEASED) {
        BusEvent::KeyReleased(CecKey::Mute)
    } else {
        BusEvent::Unrecognized
    }
}

/// Text between the last two single quotes, or empty if there are fewer than two
fn trailing_quoted(line: &str) -> &str {
    let Some(close) = line.rfind('\'') else {
        return "";
    };
    let Some(open) = line[..close].rfind('\'') else {
        return "";
    };
    &line[open + 1..close]
}

/// Extract `A` and `B` from `... from 'A' to 'B'`
fn power_transition(line: &str) -> Option<(&str, &str)> {
    let rest = &line[line.find(" from '")? + " from '".len()..];
    let from_end = rest.find('\'')?;
    let from = &rest[..from_end];

    let rest = rest[from_end + 1..].strip_prefix(" to '")?;
    let to_end = rest.find('\'')?;
    Some((from, &rest[..to_end]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tv_power_on() {
        let event = classify(">> TV (0): power status changed from 'standby' to 'on'");
        assert_eq!(
            event,
            BusEvent::PowerStatusChanged {
                source: PowerSource::Tv,
                state: "on".into()
            }
        );
    }

    #[test]
    fn test_tv_power_in_transition() {
        let event = classify(
            "TV (0): power status changed from 'standby' to 'in transition from standby to on'\n",
        );
        assert_eq!(
            event,
            BusEvent::PowerStatusChanged {
                source: PowerSource::Tv,
                state: "in transition from standby to on".into()
            }
        );
    }

    #[test]
    fn test_tv_power_without_quotes() {
        assert_eq!(
            classify("TV (0): power status changed"),
            BusEvent::PowerStatusChanged {
                source: PowerSource::Tv,
                state: String::new()
            }
        );
        assert_eq!(
            classify("TV (0): power status changed to 'on"),
            BusEvent::PowerStatusChanged {
                source: PowerSource::Tv,
                state: String::new()
            }
        );
    }

    #[test]
    fn test_playback_device_transition() {
        let event = classify("Playback 1 (4): power status changed from 'on' to 'standby'");
        assert_eq!(
            event,
            BusEvent::PowerTransition {
                from: "on".into(),
                to: "standby".into()
            }
        );
    }

    #[test]
    fn test_device_transition_malformed() {
        let event = classify("Recorder 1 (1): power status changed from 'unknown'");
        assert_eq!(
            event,
            BusEvent::PowerStatusChanged {
                source: PowerSource::OtherDevice,
                state: "unknown".into()
            }
        );
    }

    #[test]
    fn test_keys() {
        assert_eq!(
            classify("key pressed: volume up (41) current(ff) duration(0)"),
            BusEvent::KeyPressed(CecKey::VolumeUp)
        );
        assert_eq!(
            classify("key pressed: volume down (42)"),
            BusEvent::KeyPressed(CecKey::VolumeDown)
        );
        assert_eq!(classify("key pressed: mute (43)"), BusEvent::KeyPressed(CecKey::Mute));
        assert_eq!(
            classify("key released: mute (43) D:120ms"),
            BusEvent::KeyReleased(CecKey::Mute)
        );
    }

    #[test]
    fn test_ready() {
        assert_eq!(
            classify("TRAFFIC: [ 1234] << 50:7a:7f >> audio status '7f'"),
            BusEvent::ReadyForFeedback
        );
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(classify("some unrelated diagnostic"), BusEvent::Unrecognized);
        assert_eq!(classify(""), BusEvent::Unrecognized);
        // Markers are exact: other keys and partial tokens do not match
        assert_eq!(classify("key pressed: volume up"), BusEvent::Unrecognized);
        assert_eq!(classify("key released: volume up (41)"), BusEvent::Unrecognized);
        assert!(!classify("power status changed").is_recognized());
    }

    #[test]
    fn test_trailing_quoted() {
        assert_eq!(trailing_quoted("a 'b' c 'd'"), "d");
        assert_eq!(trailing_quoted("'only'"), "only");
        assert_eq!(trailing_quoted("one ' quote"), "");
        assert_eq!(trailing_quoted("no quotes"), "");
    }
}
