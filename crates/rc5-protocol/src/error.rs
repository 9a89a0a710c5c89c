//! Error types for RC-5 encoding and waveform decoding

use thiserror::Error;

/// Errors raised by the command table
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Symbolic command name is not in the fixed table
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

/// Errors that can occur while decoding a transition sequence back into bits
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WaveformError {
    /// Sequence does not end with the idle (low) half-bit
    #[error("waveform does not return to idle")]
    MissingIdle,

    /// Sequence has an odd number of data half-bits
    #[error("waveform has a dangling half-bit at index {0}")]
    DanglingHalfBit(usize),

    /// A half-bit pair is neither low-high nor high-low
    #[error("invalid half-bit pair at index {0}")]
    InvalidPair(usize),

    /// A transition touches a pin other than the expected one
    #[error("transition {index} drives foreign mask 0x{mask:08X}")]
    ForeignMask { index: usize, mask: u32 },

    /// More bits than fit in a control word
    #[error("waveform carries {0} bits, more than a control word holds")]
    TooLong(usize),
}
