//! Waveform hardware abstraction
//!
//! The bridge does not time GPIO edges itself. It hands a list of
//! [`EdgeTransition`]s to a driver that compiles them into a hardware-resident
//! waveform (DMA control blocks on a Raspberry Pi) and replays it on request.
//! The driver has a bounded pool of such waveforms.
//!
//! Implementations:
//! - [`crate::pigpio::PigpioClient`]: the `pigpiod` daemon over its socket interface
//! - `VirtualWaveHardware` (cec-sim): in-memory pool for tests

use std::future::Future;

use rc5_protocol::{EdgeTransition, GpioPin};

use crate::error::HardwareError;

/// Identifier of a hardware-resident waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaveformId(pub u32);

impl WaveformId {
    /// Get the raw id value
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Driver capable of replaying timed edge sequences on GPIO pins
pub trait WaveHardware: Send {
    /// Configure `pin` as an output
    fn set_output(&mut self, pin: GpioPin) -> impl Future<Output = Result<(), HardwareError>> + Send;

    /// Compile `transitions` into a new waveform
    ///
    /// Fails with [`HardwareError::ResourceExhausted`] when the pool is full.
    fn create_wave(
        &mut self,
        transitions: Vec<EdgeTransition>,
    ) -> impl Future<Output = Result<WaveformId, HardwareError>> + Send;

    /// Start transmitting a waveform once
    fn send_once(&mut self, id: WaveformId) -> impl Future<Output = Result<(), HardwareError>> + Send;

    /// Whether a transmission is in progress
    fn is_busy(&mut self) -> impl Future<Output = Result<bool, HardwareError>> + Send;

    /// Release one waveform
    fn delete_wave(&mut self, id: WaveformId) -> impl Future<Output = Result<(), HardwareError>> + Send;

    /// Release every waveform
    fn clear_waves(&mut self) -> impl Future<Output = Result<(), HardwareError>> + Send;
}
