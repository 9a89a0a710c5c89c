//! Manchester-style line code for a single GPIO pin
//!
//! Each bit occupies two half-bit intervals:
//! - `1`: low, then high
//! - `0`: high, then low
//!
//! The line idles low, so every waveform ends with one extra low half-bit.
//! Bits are emitted MSB first over the word's minimal binary representation;
//! leading zeros above the highest set bit are not transmitted.

use std::time::Duration;

use tracing::trace;

use crate::control_word::ControlWord;
use crate::error::WaveformError;

/// RC-5 half-bit period (889 µs, i.e. 64 cycles of a 36 kHz carrier)
pub const DEFAULT_HALF_BIT: Duration = Duration::from_micros(889);

/// Broadcom GPIO number (not the physical header pin)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpioPin(u8);

impl GpioPin {
    /// Create a pin handle
    pub const fn new(number: u8) -> Self {
        Self(number)
    }

    /// Pin number
    pub fn number(&self) -> u8 {
        self.0
    }

    /// Bit mask selecting this pin in a transition
    pub fn mask(&self) -> u32 {
        1u32 << (self.0 & 31)
    }
}

/// One half-bit interval: pins to drive high, pins to drive low, and how long
/// to hold before the next transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeTransition {
    /// Pins switched high at the start of the interval
    pub set_mask: u32,
    /// Pins switched low at the start of the interval
    pub clear_mask: u32,
    /// Interval length in microseconds
    pub duration_us: u32,
}

impl EdgeTransition {
    /// Drive `pin` high for `duration_us`
    pub fn high(pin: GpioPin, duration_us: u32) -> Self {
        Self {
            set_mask: pin.mask(),
            clear_mask: 0,
            duration_us,
        }
    }

    /// Drive `pin` low for `duration_us`
    pub fn low(pin: GpioPin, duration_us: u32) -> Self {
        Self {
            set_mask: 0,
            clear_mask: pin.mask(),
            duration_us,
        }
    }

    /// Interval length
    pub fn duration(&self) -> Duration {
        Duration::from_micros(self.duration_us as u64)
    }

    /// Level this transition leaves `pin` at, if it touches the pin exclusively
    fn level(&self, pin: GpioPin) -> Option<bool> {
        match (self.set_mask, self.clear_mask) {
            (set, 0) if set == pin.mask() => Some(true),
            (0, clear) if clear == pin.mask() => Some(false),
            _ => None,
        }
    }
}

/// Build the transition sequence for a control word
///
/// Produces `2 * word.bit_length() + 1` transitions of `half_bit` each.
pub fn build_waveform(word: ControlWord, pin: GpioPin, half_bit: Duration) -> Vec<EdgeTransition> {
    let period = half_bit.as_micros().min(u32::MAX as u128) as u32;
    let mut wave = Vec::with_capacity(2 * word.bit_length() as usize + 1);

    for bit in word.bits_msb_first() {
        if bit {
            wave.push(EdgeTransition::low(pin, period));
            wave.push(EdgeTransition::high(pin, period));
        } else {
            wave.push(EdgeTransition::high(pin, period));
            wave.push(EdgeTransition::low(pin, period));
        }
    }

    // Return the line to idle
    wave.push(EdgeTransition::low(pin, period));

    trace!("Built {} transitions for word {}", wave.len(), word);
    wave
}

/// Read a transition sequence back into the word it carries
///
/// This is the inverse of [`build_waveform`]: half-bit pairs are read as bits
/// (low-high = 1, high-low = 0) and the trailing idle half-bit is required.
/// Durations are not checked.
pub fn decode_waveform(wave: &[EdgeTransition], pin: GpioPin) -> Result<u16, WaveformError> {
    let (idle, data) = wave.split_last().ok_or(WaveformError::MissingIdle)?;
    if idle.level(pin) != Some(false) {
        return Err(WaveformError::MissingIdle);
    }

    if data.len() % 2 != 0 {
        return Err(WaveformError::DanglingHalfBit(data.len() - 1));
    }

    let bit_count = data.len() / 2;
    if bit_count > u16::BITS as usize {
        return Err(WaveformError::TooLong(bit_count));
    }

    let mut word: u16 = 0;
    for (pair_index, pair) in data.chunks_exact(2).enumerate() {
        let index = pair_index * 2;
        let first = pair[0].level(pin).ok_or(WaveformError::ForeignMask {
            index,
            mask: pair[0].set_mask | pair[0].clear_mask,
        })?;
        let second = pair[1].level(pin).ok_or(WaveformError::ForeignMask {
            index: index + 1,
            mask: pair[1].set_mask | pair[1].clear_mask,
        })?;

        let bit = match (first, second) {
            (false, true) => 1,
            (true, false) => 0,
            _ => return Err(WaveformError::InvalidPair(index)),
        };
        word = (word << 1) | bit;
    }

    Ok(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PIN: GpioPin = GpioPin(4);

    #[test]
    fn test_waveform_length() {
        let word = ControlWord::encode(16, 16);
        let wave = build_waveform(word, PIN, DEFAULT_HALF_BIT);
        assert_eq!(wave.len(), 29);
    }

    #[test]
    fn test_waveform_ends_idle() {
        let wave = build_waveform(ControlWord::encode(16, 110), PIN, DEFAULT_HALF_BIT);
        let last = wave.last().unwrap();
        assert_eq!(last.set_mask, 0);
        assert_eq!(last.clear_mask, 1 << 4);
        assert_eq!(last.duration_us, 889);
    }

    #[test]
    fn test_one_bit_starts_low() {
        // Highest bit is always 1, so the waveform starts low then goes high
        let wave = build_waveform(ControlWord::from_bits(0b10), PIN, DEFAULT_HALF_BIT);
        assert_eq!(
            wave,
            vec![
                EdgeTransition::low(PIN, 889),
                EdgeTransition::high(PIN, 889),
                EdgeTransition::high(PIN, 889),
                EdgeTransition::low(PIN, 889),
                EdgeTransition::low(PIN, 889),
            ]
        );
    }

    #[test]
    fn test_zero_word_is_idle_only() {
        let wave = build_waveform(ControlWord::from_bits(0), PIN, DEFAULT_HALF_BIT);
        assert_eq!(wave, vec![EdgeTransition::low(PIN, 889)]);
    }

    #[test]
    fn test_custom_period() {
        let wave = build_waveform(
            ControlWord::from_bits(1),
            PIN,
            Duration::from_micros(500),
        );
        assert!(wave.iter().all(|t| t.duration_us == 500));
    }

    #[test]
    fn test_decode_rejects_missing_idle() {
        let mut wave = build_waveform(ControlWord::encode(16, 16), PIN, DEFAULT_HALF_BIT);
        wave.pop();
        assert!(decode_waveform(&wave, PIN).is_err());
        assert_eq!(decode_waveform(&[], PIN), Err(WaveformError::MissingIdle));
    }

    #[test]
    fn test_decode_rejects_foreign_pin() {
        let wave = build_waveform(ControlWord::encode(16, 16), GpioPin::new(17), DEFAULT_HALF_BIT);
        assert!(decode_waveform(&wave, PIN).is_err());
    }

    #[test]
    fn test_decode_rejects_flat_pair() {
        let wave = vec![
            EdgeTransition::high(PIN, 889),
            EdgeTransition::high(PIN, 889),
            EdgeTransition::low(PIN, 889),
        ];
        assert_eq!(decode_waveform(&wave, PIN), Err(WaveformError::InvalidPair(0)));
    }

    proptest! {
        #[test]
        fn decode_inverts_build(bits in any::<u16>(), pin in 0u8..28) {
            let pin = GpioPin::new(pin);
            let word = ControlWord::from_bits(bits);
            let wave = build_waveform(word, pin, DEFAULT_HALF_BIT);

            prop_assert_eq!(wave.len(), 2 * word.bit_length() as usize + 1);
            prop_assert_eq!(decode_waveform(&wave, pin), Ok(bits));
        }
    }
}
