//! Device state controller
//!
//! Consumes classified bus events, decides which amplifier commands to send
//! and which feedback frames to report back to the TV.
//!
//! | Event | Action |
//! |---|---|
//! | TV/device powers on | settle delay, `ampon` x4, unmute, report audio system active |
//! | TV/device enters standby | `ampoff` x4 |
//! | Adapter ready | report baseline volume |
//! | Volume up/down key | report raised/lowered volume, `vol+`/`vol-` x steps |
//! | Mute key (configured edge) | toggle `muteon`/`muteoff` |

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use rc5_protocol::AmpCommand;

use crate::config::{BridgeConfig, MuteTrigger};
use crate::dispatcher::CommandDispatcher;
use crate::error::HardwareError;
use crate::events::{classify, BusEvent, CecKey};
use crate::hardware::WaveHardware;
use crate::state::{AmpPower, DeviceState, Feedback};

/// Power states reported by CEC devices that mean "turn the amplifier on"
const POWER_ON_STATES: &[&str] = &["on", "in transition from standby to on"];
const STANDBY_STATE: &str = "standby";
const ON_STATE: &str = "on";

/// Amplifier state machine driven by CEC events
pub struct DeviceController<H> {
    config: BridgeConfig,
    state: DeviceState,
    dispatcher: CommandDispatcher<H>,
    feedback_tx: mpsc::Sender<Feedback>,
}

impl<H: WaveHardware> DeviceController<H> {
    /// Create a controller
    ///
    /// # Arguments
    ///
    /// * `config` - Bridge configuration
    /// * `hw` - Waveform hardware, owned exclusively by this controller
    /// * `feedback_tx` - Sink for frames written back to the adapter
    pub fn new(config: BridgeConfig, hw: H, feedback_tx: mpsc::Sender<Feedback>) -> Self {
        let dispatcher = CommandDispatcher::new(hw, &config);
        Self {
            config,
            state: DeviceState::new(),
            dispatcher,
            feedback_tx,
        }
    }

    /// Current amplifier state
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Configuration in use
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Command dispatcher
    pub fn dispatcher(&self) -> &CommandDispatcher<H> {
        &self.dispatcher
    }

    /// Prepare the hardware for transmission
    pub async fn start(&mut self) -> Result<(), HardwareError> {
        self.dispatcher.prepare().await
    }

    /// Classify and handle one adapter line
    pub async fn handle_line(&mut self, line: &str) -> BusEvent {
        debug!(target: "cec", "{}", line);

        let event = classify(line);
        self.handle_event(&event).await;
        event
    }

    /// Handle one classified event
    pub async fn handle_event(&mut self, event: &BusEvent) {
        match event {
            BusEvent::PowerStatusChanged { source, state } => {
                debug!("{:?} power status: '{}'", source, state);
                if POWER_ON_STATES.contains(&state.as_str()) {
                    self.power_on().await;
                } else if state == STANDBY_STATE {
                    self.power_off().await;
                }
            }
            BusEvent::PowerTransition { from, to } => {
                debug!("Device power transition '{}' -> '{}'", from, to);
                if to == ON_STATE {
                    self.power_on().await;
                } else if to == STANDBY_STATE {
                    self.power_off().await;
                }
            }
            BusEvent::ReadyForFeedback => {
                self.report(Feedback::VolumeLevel(self.config.baseline_volume))
                    .await;
            }
            BusEvent::KeyPressed(CecKey::VolumeUp) => {
                info!("Volume up");
                self.report(Feedback::VolumeLevel(self.config.volume_up_level))
                    .await;
                self.dispatcher
                    .send(AmpCommand::VolumeUp, self.config.volume_steps)
                    .await;
            }
            BusEvent::KeyPressed(CecKey::VolumeDown) => {
                info!("Volume down");
                self.report(Feedback::VolumeLevel(self.config.volume_down_level))
                    .await;
                self.dispatcher
                    .send(AmpCommand::VolumeDown, self.config.volume_steps)
                    .await;
            }
            BusEvent::KeyPressed(CecKey::Mute) if self.config.mute_trigger == MuteTrigger::Pressed => {
                self.toggle_mute().await;
            }
            BusEvent::KeyReleased(CecKey::Mute) if self.config.mute_trigger == MuteTrigger::Released => {
                self.toggle_mute().await;
            }
            BusEvent::KeyPressed(_) | BusEvent::KeyReleased(_) | BusEvent::Unrecognized => {}
        }
    }

    /// Release hardware resources
    pub async fn shutdown(&mut self) -> Result<(), HardwareError> {
        self.dispatcher.shutdown().await
    }

    async fn power_on(&mut self) {
        // Let the amplifier finish its own boot before commanding it
        sleep(self.config.settle_delay()).await;

        self.dispatcher
            .send(AmpCommand::AmpOn, self.config.power_repeat)
            .await;
        self.state.muted = false;
        self.report(Feedback::AudioSystemActive).await;
        self.state.amp_power = AmpPower::PoweredOn;
        info!("Amp on");
    }

    async fn power_off(&mut self) {
        self.dispatcher
            .send(AmpCommand::AmpOff, self.config.power_repeat)
            .await;
        self.state.amp_power = AmpPower::Standby;
        info!("Amp off");
    }

    async fn toggle_mute(&mut self) {
        if self.state.muted {
            self.dispatcher.send(AmpCommand::MuteOff, 1).await;
            self.state.muted = false;
            info!("Mute off");
        } else {
            self.dispatcher.send(AmpCommand::MuteOn, 1).await;
            self.state.muted = true;
            info!("Mute on");
        }
    }

    async fn report(&mut self, feedback: Feedback) {
        debug!("Reporting {}", feedback);
        if self.feedback_tx.send(feedback).await.is_err() {
            warn!("Feedback sink closed, dropping {}", feedback);
        }
    }
}
