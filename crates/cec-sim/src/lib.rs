//! CEC Bridge Simulation Library
//!
//! This crate provides a simulation layer for testing the CEC bridge without
//! a Raspberry Pi or a `pigpiod` daemon. It includes:
//!
//! - **VirtualWaveHardware**: bounded waveform pool that records every
//!   transmission
//! - **VirtualWaveProbe**: shared handle to inspect the pool and decode what
//!   the amplifier would have received
//!
//! # Example
//!
//! ```rust
//! use cec_sim::VirtualWaveHardware;
//!
//! let hw = VirtualWaveHardware::new(4).with_busy_polls(1);
//! let probe = hw.probe();
//!
//! // Move `hw` into a DeviceController or run_bridge, then inspect:
//! assert_eq!(probe.live_waves(), 0);
//! assert!(probe.transmissions().is_empty());
//! ```

pub mod hardware;

pub use hardware::{VirtualWaveHardware, VirtualWaveProbe, DEFAULT_CAPACITY};
