//! CEC to RC-5 Bridge Engine
//!
//! This crate watches HDMI-CEC traffic (as printed by `cec-client`) and
//! drives an RC-5 controlled amplifier over a GPIO pin, reporting volume
//! feedback back to the TV.
//!
//! # Architecture
//!
//! - **Classifier** ([`events`]): adapter text line → [`BusEvent`]
//! - **Controller** ([`controller`]): amplifier power/mute state machine
//! - **Dispatcher** ([`dispatcher`]): command → control word → waveform
//! - **Waveform manager** ([`waveform`]): bounded hardware pool with
//!   clear-and-retry on exhaustion
//! - **Hardware** ([`hardware`]): driver trait, implemented for `pigpiod`
//!   in [`pigpio`]
//!
//! [`run_bridge`] ties them together around a line stream and a feedback sink.
//!
//! # Example
//!
//! ```rust
//! use cec_bridge::{classify, BusEvent, CecKey};
//!
//! assert_eq!(
//!     classify("key pressed: volume up (41)"),
//!     BusEvent::KeyPressed(CecKey::VolumeUp)
//! );
//! assert_eq!(classify("waiting for input"), BusEvent::Unrecognized);
//! ```

pub mod bridge;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod hardware;
pub mod pigpio;
pub mod state;
pub mod waveform;

pub use bridge::{run_bridge, run_feedback_writer, BridgeSummary, StopReason};
pub use config::{BridgeConfig, MuteTrigger};
pub use controller::DeviceController;
pub use dispatcher::CommandDispatcher;
pub use error::{BridgeError, HardwareError};
pub use events::{classify, BusEvent, CecKey, PowerSource};
pub use hardware::{WaveHardware, WaveformId};
pub use pigpio::PigpioClient;
pub use state::{AmpPower, DeviceState, Feedback};
pub use waveform::{WaveStats, WaveformManager};
