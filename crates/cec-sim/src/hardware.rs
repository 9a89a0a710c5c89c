//! Virtual waveform hardware
//!
//! Simulates a driver with a bounded waveform pool. Every waveform sent is
//! recorded so tests can decode what the amplifier would have received, and
//! the pool can be forced into exhaustion to exercise recovery paths.
//!
//! The hardware itself is moved into the bridge; tests keep a
//! [`VirtualWaveProbe`] that shares its state.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use cec_bridge::{HardwareError, WaveHardware, WaveformId};
use rc5_protocol::{decode_waveform, AmpCommand, ControlWord, EdgeTransition, GpioPin};
use tracing::debug;

/// pigpio's "non existent wave id"
const BAD_WAVE_ID: i32 = -66;
/// pigpio's "no more waveforms"
const NO_WAVEFORM_ID: i32 = -70;

/// Default pool size (pigpio allows 250 wave ids)
pub const DEFAULT_CAPACITY: usize = 250;

#[derive(Debug, Default)]
struct PoolState {
    capacity: usize,
    next_id: u32,
    waves: BTreeMap<u32, Vec<EdgeTransition>>,
    output_pins: Vec<GpioPin>,
    transmissions: Vec<Vec<EdgeTransition>>,
    /// Busy polls reported after each send
    busy_polls: u32,
    busy_remaining: u32,
    /// Upcoming creates forced to fail regardless of capacity
    forced_exhaustion: usize,
    fail_sends: bool,
    fail_deletes: bool,
    created: u64,
    deleted: u64,
    clears: u64,
    sends_while_busy: u64,
}

fn lock(state: &Mutex<PoolState>) -> MutexGuard<'_, PoolState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Simulated waveform driver
pub struct VirtualWaveHardware {
    state: Arc<Mutex<PoolState>>,
}

impl VirtualWaveHardware {
    /// Create a driver with room for `capacity` waveforms
    pub fn new(capacity: usize) -> Self {
        let state = PoolState {
            capacity,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Report busy for `polls` checks after each send
    pub fn with_busy_polls(self, polls: u32) -> Self {
        lock(&self.state).busy_polls = polls;
        self
    }

    /// Handle for inspecting and steering this driver after it is moved
    pub fn probe(&self) -> VirtualWaveProbe {
        VirtualWaveProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for VirtualWaveHardware {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl WaveHardware for VirtualWaveHardware {
    async fn set_output(&mut self, pin: GpioPin) -> Result<(), HardwareError> {
        let mut state = lock(&self.state);
        if !state.output_pins.contains(&pin) {
            state.output_pins.push(pin);
        }
        Ok(())
    }

    async fn create_wave(
        &mut self,
        transitions: Vec<EdgeTransition>,
    ) -> Result<WaveformId, HardwareError> {
        let mut state = lock(&self.state);

        if state.forced_exhaustion > 0 {
            state.forced_exhaustion -= 1;
            return Err(HardwareError::ResourceExhausted {
                code: NO_WAVEFORM_ID,
            });
        }
        if state.waves.len() >= state.capacity {
            return Err(HardwareError::ResourceExhausted {
                code: NO_WAVEFORM_ID,
            });
        }

        let id = state.next_id;
        state.next_id = state.next_id.wrapping_add(1);
        state.waves.insert(id, transitions);
        state.created += 1;
        debug!("Virtual wave {} created", id);
        Ok(WaveformId(id))
    }

    async fn send_once(&mut self, id: WaveformId) -> Result<(), HardwareError> {
        let mut state = lock(&self.state);

        if state.fail_sends {
            return Err(HardwareError::Disconnected);
        }
        let Some(wave) = state.waves.get(&id.0).cloned() else {
            return Err(HardwareError::Command {
                command: "WVTX",
                code: BAD_WAVE_ID,
            });
        };

        if state.busy_remaining > 0 {
            state.sends_while_busy += 1;
        }
        state.transmissions.push(wave);
        state.busy_remaining = state.busy_polls;
        Ok(())
    }

    async fn is_busy(&mut self) -> Result<bool, HardwareError> {
        let mut state = lock(&self.state);
        if state.busy_remaining > 0 {
            state.busy_remaining -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_wave(&mut self, id: WaveformId) -> Result<(), HardwareError> {
        let mut state = lock(&self.state);
        if state.fail_deletes {
            return Err(HardwareError::Disconnected);
        }
        if state.waves.remove(&id.0).is_none() {
            return Err(HardwareError::Command {
                command: "WVDEL",
                code: BAD_WAVE_ID,
            });
        }
        state.deleted += 1;
        Ok(())
    }

    async fn clear_waves(&mut self) -> Result<(), HardwareError> {
        let mut state = lock(&self.state);
        state.waves.clear();
        state.busy_remaining = 0;
        state.clears += 1;
        Ok(())
    }
}

/// Shared view of a [`VirtualWaveHardware`]
#[derive(Clone)]
pub struct VirtualWaveProbe {
    state: Arc<Mutex<PoolState>>,
}

impl VirtualWaveProbe {
    /// Fail the next `count` creates with resource exhaustion
    pub fn exhaust_next_creates(&self, count: usize) {
        lock(&self.state).forced_exhaustion = count;
    }

    /// Make every send fail (simulates a lost daemon)
    pub fn fail_sends(&self, fail: bool) {
        lock(&self.state).fail_sends = fail;
    }

    /// Make every individual delete fail
    pub fn fail_deletes(&self, fail: bool) {
        lock(&self.state).fail_deletes = fail;
    }

    /// Fill the pool with waveforms nobody owns
    pub fn occupy(&self, count: usize) {
        let mut state = lock(&self.state);
        for _ in 0..count {
            let id = state.next_id;
            state.next_id = state.next_id.wrapping_add(1);
            state.waves.insert(id, Vec::new());
        }
    }

    /// Waveforms currently held by the driver
    pub fn live_waves(&self) -> usize {
        lock(&self.state).waves.len()
    }

    /// Waveforms created through the driver
    pub fn created(&self) -> u64 {
        lock(&self.state).created
    }

    /// Waveforms deleted individually
    pub fn deleted(&self) -> u64 {
        lock(&self.state).deleted
    }

    /// Pool clears received
    pub fn clears(&self) -> u64 {
        lock(&self.state).clears
    }

    /// Sends issued while a previous transmission was still running
    pub fn sends_while_busy(&self) -> u64 {
        lock(&self.state).sends_while_busy
    }

    /// Pins configured as outputs
    pub fn output_pins(&self) -> Vec<GpioPin> {
        lock(&self.state).output_pins.clone()
    }

    /// Every waveform transmitted, in order
    pub fn transmissions(&self) -> Vec<Vec<EdgeTransition>> {
        lock(&self.state).transmissions.clone()
    }

    /// Control words transmitted on `pin`, skipping undecodable waveforms
    pub fn transmitted_words(&self, pin: GpioPin) -> Vec<ControlWord> {
        self.transmissions()
            .iter()
            .filter_map(|wave| decode_waveform(wave, pin).ok())
            .map(ControlWord::from_bits)
            .collect()
    }

    /// Amplifier commands transmitted on `pin`
    pub fn transmitted_commands(&self, pin: GpioPin) -> Vec<AmpCommand> {
        self.transmitted_words(pin)
            .iter()
            .filter_map(|word| AmpCommand::from_wire(word.start(), word.command()))
            .collect()
    }

    /// Forget recorded transmissions
    pub fn clear_transmissions(&self) {
        lock(&self.state).transmissions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc5_protocol::{build_waveform, DEFAULT_HALF_BIT};

    fn wave(cmd: AmpCommand) -> Vec<EdgeTransition> {
        build_waveform(
            ControlWord::encode(16, cmd.code()),
            GpioPin::new(4),
            DEFAULT_HALF_BIT,
        )
    }

    #[tokio::test]
    async fn test_capacity_exhaustion() {
        let mut hw = VirtualWaveHardware::new(2);
        hw.create_wave(wave(AmpCommand::VolumeUp)).await.unwrap();
        hw.create_wave(wave(AmpCommand::VolumeUp)).await.unwrap();

        let err = hw.create_wave(wave(AmpCommand::VolumeUp)).await.unwrap_err();
        assert!(err.is_exhaustion());

        hw.clear_waves().await.unwrap();
        assert!(hw.create_wave(wave(AmpCommand::VolumeUp)).await.is_ok());
    }

    #[tokio::test]
    async fn test_records_transmissions() {
        let mut hw = VirtualWaveHardware::default();
        let probe = hw.probe();

        let id = hw.create_wave(wave(AmpCommand::AmpOn)).await.unwrap();
        hw.send_once(id).await.unwrap();
        hw.send_once(id).await.unwrap();

        assert_eq!(
            probe.transmitted_commands(GpioPin::new(4)),
            vec![AmpCommand::AmpOn, AmpCommand::AmpOn]
        );
    }

    #[tokio::test]
    async fn test_busy_polls() {
        let mut hw = VirtualWaveHardware::default().with_busy_polls(2);
        let probe = hw.probe();
        let id = hw.create_wave(wave(AmpCommand::Mute)).await.unwrap();

        hw.send_once(id).await.unwrap();
        assert!(hw.is_busy().await.unwrap());
        hw.send_once(id).await.unwrap();
        assert_eq!(probe.sends_while_busy(), 1);
    }

    #[tokio::test]
    async fn test_unknown_wave() {
        let mut hw = VirtualWaveHardware::default();
        assert!(hw.send_once(WaveformId(7)).await.is_err());
        assert!(hw.delete_wave(WaveformId(7)).await.is_err());
    }
}
