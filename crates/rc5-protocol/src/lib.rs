//! RC-5 Protocol Library
//!
//! This crate provides encoding for the RC-5 style infrared remote-control
//! protocol used by Cambridge Audio amplifiers, and the line-code waveform
//! that carries it on a single GPIO pin:
//!
//! - **Control word**: 3-bit start field, 5-bit system id, 6-bit command
//! - **Waveform**: Manchester-style half-bit edge transitions, idle low
//! - **Commands**: the fixed table of amplifier command codes
//!
//! # Architecture
//!
//! Encoding is split into two pure steps so that each can be tested on its own:
//!
//! ```text
//! AmpCommand --code--> ControlWord::encode --bits--> build_waveform --> [EdgeTransition]
//! ```
//!
//! The transitions are handed to whatever drives the pin (a `pigpiod` daemon
//! in production, a simulator in tests).
//!
//! # Example
//!
//! ```rust
//! use rc5_protocol::{build_waveform, AmpCommand, ControlWord, GpioPin, DEFAULT_HALF_BIT};
//!
//! let word = ControlWord::encode(16, AmpCommand::VolumeUp.code());
//! assert_eq!(word.bits(), 0b110_10000_010000);
//!
//! let wave = build_waveform(word, GpioPin::new(4), DEFAULT_HALF_BIT);
//! assert_eq!(wave.len(), 2 * word.bit_length() as usize + 1);
//! ```

pub mod command;
pub mod control_word;
pub mod error;
pub mod waveform;

pub use command::AmpCommand;
pub use control_word::ControlWord;
pub use error::{ProtocolError, WaveformError};
pub use waveform::{build_waveform, decode_waveform, EdgeTransition, GpioPin, DEFAULT_HALF_BIT};

/// System id used by Cambridge Audio amplifiers
pub const CAMBRIDGE_AUDIO_SYSTEM: u8 = 16;
