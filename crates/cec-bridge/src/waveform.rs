//! Waveform resource management
//!
//! Owns the hardware driver and every waveform handle created through it.
//! Each successful [`WaveformManager::create`] is paired with exactly one
//! [`WaveformManager::delete`] once the hardware is idle, unless the handle is
//! dropped by a pool clear first.
//!
//! # Exhaustion
//!
//! When the driver reports the pool is full, the manager clears the whole
//! pool once and retries. A second exhaustion is reported as
//! [`BridgeError::HardwareExhausted`].

use std::time::Duration;

use rc5_protocol::{EdgeTransition, GpioPin};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{BridgeError, HardwareError};
use crate::hardware::{WaveHardware, WaveformId};

/// Lifetime counters for waveform handles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaveStats {
    /// Handles returned by `create`
    pub created: u64,
    /// Handles released by `delete`
    pub deleted: u64,
    /// Handles dropped by a pool clear
    pub abandoned: u64,
    /// Pool clears issued
    pub clears: u64,
}

/// Bounded waveform pool manager
pub struct WaveformManager<H> {
    hw: H,
    outstanding: Vec<WaveformId>,
    pacing: Duration,
    poll_interval: Duration,
    stats: WaveStats,
}

impl<H: WaveHardware> WaveformManager<H> {
    /// Create a manager
    ///
    /// # Arguments
    ///
    /// * `hw` - Waveform driver
    /// * `pacing` - Gap between repeated sends of the same waveform
    /// * `poll_interval` - Interval between busy checks while waiting for idle
    pub fn new(hw: H, pacing: Duration, poll_interval: Duration) -> Self {
        Self {
            hw,
            outstanding: Vec::new(),
            pacing,
            poll_interval,
            stats: WaveStats::default(),
        }
    }

    /// Borrow the driver
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Handle counters
    pub fn stats(&self) -> WaveStats {
        self.stats
    }

    /// Handles created but not yet deleted or cleared
    pub fn outstanding(&self) -> &[WaveformId] {
        &self.outstanding
    }

    /// Configure the output pin
    pub async fn prepare(&mut self, pin: GpioPin) -> Result<(), HardwareError> {
        self.hw.set_output(pin).await
    }

    /// Create a waveform, clearing the pool and retrying once on exhaustion
    pub async fn create(
        &mut self,
        transitions: Vec<EdgeTransition>,
    ) -> Result<WaveformId, BridgeError> {
        let id = match self.hw.create_wave(transitions.clone()).await {
            Ok(id) => id,
            Err(e) if e.is_exhaustion() => {
                warn!("Waveform pool exhausted ({}), clearing and retrying", e);
                self.clear_all().await?;

                match self.hw.create_wave(transitions).await {
                    Ok(id) => id,
                    Err(e) if e.is_exhaustion() => return Err(BridgeError::HardwareExhausted),
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        };

        self.outstanding.push(id);
        self.stats.created += 1;
        debug!("Created waveform {}", id.0);
        Ok(id)
    }

    /// Send a waveform `repeat` times, waiting for idle before each send
    pub async fn play(&mut self, id: WaveformId, repeat: u32) -> Result<(), HardwareError> {
        for i in 0..repeat {
            if i > 0 {
                sleep(self.pacing).await;
            }
            self.wait_idle().await?;
            self.hw.send_once(id).await?;
        }
        Ok(())
    }

    /// Block until no transmission is in progress
    pub async fn wait_idle(&mut self) -> Result<(), HardwareError> {
        while self.hw.is_busy().await? {
            sleep(self.poll_interval).await;
        }
        Ok(())
    }

    /// Release a waveform
    ///
    /// Handles already dropped by a pool clear are not released again. A
    /// handle the driver fails to release stays outstanding.
    pub async fn delete(&mut self, id: WaveformId) -> Result<(), HardwareError> {
        if !self.outstanding.contains(&id) {
            debug!("Waveform {} already released", id.0);
            return Ok(());
        }

        self.hw.delete_wave(id).await?;
        self.outstanding.retain(|&w| w != id);
        self.stats.deleted += 1;
        debug!("Deleted waveform {}", id.0);
        Ok(())
    }

    /// Drop every waveform on the hardware side
    pub async fn clear_all(&mut self) -> Result<(), HardwareError> {
        self.hw.clear_waves().await?;
        self.stats.abandoned += self.outstanding.len() as u64;
        self.stats.clears += 1;
        self.outstanding.clear();
        Ok(())
    }

    /// Create, play, wait for idle and delete a waveform
    ///
    /// The waveform is deleted even if playing it fails.
    pub async fn transmit(
        &mut self,
        transitions: Vec<EdgeTransition>,
        repeat: u32,
    ) -> Result<(), BridgeError> {
        let id = self.create(transitions).await?;

        let played = self.play(id, repeat).await;
        let idle = self.wait_idle().await;
        let deleted = self.delete(id).await;

        played?;
        idle?;
        deleted?;
        Ok(())
    }

    /// Release outstanding waveforms and clear the pool
    pub async fn shutdown(&mut self) -> Result<(), HardwareError> {
        if let Err(e) = self.wait_idle().await {
            warn!("Could not confirm idle before shutdown: {}", e);
        }

        for id in self.outstanding.clone() {
            if let Err(e) = self.delete(id).await {
                warn!("Failed to delete waveform {}: {}", id.0, e);
            }
        }

        self.clear_all().await
    }
}
