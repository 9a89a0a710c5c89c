//! Command dispatch
//!
//! Turns an [`AmpCommand`] into a control word, builds its waveform and hands
//! it to the [`WaveformManager`]. Transmission is fire-and-forget: the
//! amplifier never acknowledges, so hardware failures are logged and dropped
//! rather than surfaced to the event loop.

use std::time::Duration;

use rc5_protocol::{build_waveform, AmpCommand, ControlWord, GpioPin};
use tracing::{debug, error, warn};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, HardwareError};
use crate::hardware::WaveHardware;
use crate::waveform::WaveformManager;

/// Sends amplifier commands over the waveform hardware
pub struct CommandDispatcher<H> {
    waves: WaveformManager<H>,
    system_id: u8,
    pin: GpioPin,
    half_bit: Duration,
    halted: bool,
}

impl<H: WaveHardware> CommandDispatcher<H> {
    /// Create a dispatcher over `hw`
    pub fn new(hw: H, config: &BridgeConfig) -> Self {
        Self {
            waves: WaveformManager::new(hw, config.repeat_pacing(), config.idle_poll()),
            system_id: config.system_id,
            pin: config.pin(),
            half_bit: config.half_bit(),
            halted: false,
        }
    }

    /// Waveform manager
    pub fn waves(&self) -> &WaveformManager<H> {
        &self.waves
    }

    /// Whether transmission stopped after hardware exhaustion
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Configure the output pin
    pub async fn prepare(&mut self) -> Result<(), HardwareError> {
        self.waves.prepare(self.pin).await
    }

    /// Transmit `command` `repeat` times, logging and swallowing failures
    pub async fn send(&mut self, command: AmpCommand, repeat: u32) {
        if let Err(e) = self.try_send(command, repeat).await {
            match e {
                BridgeError::HardwareExhausted => {
                    error!("Sending {} failed: {}; further transmissions disabled", command, e)
                }
                BridgeError::TransmitHalted => debug!("Skipping {}: {}", command, e),
                _ => warn!("Sending {} failed: {}", command, e),
            }
        }
    }

    /// Transmit a command by its symbolic name
    ///
    /// Unknown names are a configuration error and are returned to the caller;
    /// transmission failures are swallowed as in [`Self::send`].
    pub async fn send_named(&mut self, name: &str, repeat: u32) -> Result<(), BridgeError> {
        let command = AmpCommand::from_name(name)?;
        self.send(command, repeat).await;
        Ok(())
    }

    /// Transmit `command` and report the outcome
    pub async fn try_send(&mut self, command: AmpCommand, repeat: u32) -> Result<(), BridgeError> {
        if self.halted {
            return Err(BridgeError::TransmitHalted);
        }

        let word = ControlWord::encode(self.system_id, command.code());
        let wave = build_waveform(word, self.pin, self.half_bit);
        debug!("Sending {} ({}) x{}", command, word, repeat);

        let result = self.waves.transmit(wave, repeat).await;
        if matches!(result, Err(BridgeError::HardwareExhausted)) {
            self.halted = true;
        }
        result
    }

    /// Release all waveforms
    pub async fn shutdown(&mut self) -> Result<(), HardwareError> {
        self.waves.shutdown().await
    }
}
