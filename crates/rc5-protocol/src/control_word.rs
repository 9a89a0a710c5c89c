//! RC-5 control word
//!
//! # Format
//! ```text
//!  15 14 | 13 12 11 | 10  9  8  7  6 | 5  4  3  2  1  0
//!  unused|  start   |    system id    |     command
//! ```
//!
//! The start field is `0b100`, with `0b010` added when the command fits in six
//! bits. Commands of 64 and above (the extended range) drop that bit and keep
//! only their low six bits in the command field.

/// Start field bit that is always set
const START_BIT: u8 = 0b100;
/// Start field bit set for commands below 64
const FIELD_BIT: u8 = 0b010;

const START_SHIFT: u16 = 11;
const SYSTEM_SHIFT: u16 = 6;
const START_MASK: u16 = 0b111;
const SYSTEM_MASK: u16 = 0b11111;
const COMMAND_MASK: u16 = 0b111111;

/// A 16-bit RC-5 control word (only the low 14 bits are meaningful)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlWord(u16);

impl ControlWord {
    /// Encode a system id and command code
    ///
    /// Out-of-range values are masked to their low bits rather than rejected,
    /// matching what receivers observe from real remotes.
    pub fn encode(system: u8, command: u8) -> Self {
        let start = START_BIT | if command < 64 { FIELD_BIT } else { 0 };

        let word = ((start as u16 & START_MASK) << START_SHIFT)
            | ((system as u16 & SYSTEM_MASK) << SYSTEM_SHIFT)
            | (command as u16 & COMMAND_MASK);

        Self(word)
    }

    /// Wrap a raw word (e.g. one decoded from a waveform)
    pub fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Raw word value
    pub fn bits(&self) -> u16 {
        self.0
    }

    /// 3-bit start field
    pub fn start(&self) -> u8 {
        ((self.0 >> START_SHIFT) & START_MASK) as u8
    }

    /// 5-bit system id
    pub fn system(&self) -> u8 {
        ((self.0 >> SYSTEM_SHIFT) & SYSTEM_MASK) as u8
    }

    /// 6-bit command field
    pub fn command(&self) -> u8 {
        (self.0 & COMMAND_MASK) as u8
    }

    /// Length of the minimal binary representation (no leading zeros)
    pub fn bit_length(&self) -> u32 {
        u16::BITS - self.0.leading_zeros()
    }

    /// Bits from most to least significant over the minimal representation
    pub fn bits_msb_first(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.bit_length()).rev().map(move |i| (self.0 >> i) & 1 == 1)
    }
}

impl std::fmt::Display for ControlWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:03b}_{:05b}_{:06b}",
            self.start(),
            self.system(),
            self.command()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_volume_up() {
        let word = ControlWord::encode(16, 16);
        assert_eq!(word.bits(), 0b110_10000_010000);
        assert_eq!(word.bits(), 13328);
    }

    #[test]
    fn test_encode_mute() {
        let word = ControlWord::encode(16, 13);
        assert_eq!(word.bits(), 0b110_10000_001101);
        assert_eq!(word.bits(), 13325);
    }

    #[test]
    fn test_encode_extended_command() {
        // source- (126) is outside the 6-bit range: start loses its field bit
        let word = ControlWord::encode(16, 126);
        assert_eq!(word.start(), 0b100);
        assert_eq!(word.command(), 62);
        assert_eq!(word.bits(), 9278);
    }

    #[test]
    fn test_encode_masks_system() {
        let word = ControlWord::encode(0b1_00011, 5);
        assert_eq!(word.system(), 0b00011);
    }

    #[test]
    fn test_bit_length() {
        assert_eq!(ControlWord::encode(16, 16).bit_length(), 14);
        assert_eq!(ControlWord::from_bits(0).bit_length(), 0);
        assert_eq!(ControlWord::from_bits(1).bit_length(), 1);
    }

    #[test]
    fn test_bits_msb_first() {
        let bits: Vec<bool> = ControlWord::from_bits(0b1011).bits_msb_first().collect();
        assert_eq!(bits, vec![true, false, true, true]);
    }

    #[test]
    fn test_display() {
        assert_eq!(ControlWord::encode(16, 16).to_string(), "110_10000_010000");
    }

    proptest! {
        #[test]
        fn fields_roundtrip(system in 0u8..32, command in 0u8..64) {
            let word = ControlWord::encode(system, command);
            prop_assert_eq!(word.system(), system);
            prop_assert_eq!(word.command(), command);
            prop_assert_eq!(word.start(), 0b110);
            prop_assert_eq!(word.bits() >> 14, 0);
        }

        #[test]
        fn extended_commands_clear_field_bit(system in 0u8..32, command in 64u8..=255) {
            let word = ControlWord::encode(system, command);
            prop_assert_eq!(word.start(), 0b100);
            prop_assert_eq!(word.command(), command & 0b111111);
        }
    }
}
