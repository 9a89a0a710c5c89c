//! Error types for the bridge

use thiserror::Error;

/// Errors reported by the waveform hardware
#[derive(Debug, Error)]
pub enum HardwareError {
    /// The hardware waveform pool is full
    #[error("waveform resources exhausted (code {code})")]
    ResourceExhausted {
        /// Driver status code
        code: i32,
    },

    /// The driver rejected a command
    #[error("{command} failed with code {code}")]
    Command {
        /// Driver command name
        command: &'static str,
        /// Driver status code
        code: i32,
    },

    /// Connection to the driver is gone
    #[error("waveform driver disconnected")]
    Disconnected,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Whether clearing the waveform pool may allow a retry to succeed
    pub fn is_exhaustion(&self) -> bool {
        matches!(self, HardwareError::ResourceExhausted { .. })
    }
}

/// Errors that can occur in the bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Command name not in the fixed table
    #[error(transparent)]
    UnknownCommand(#[from] rc5_protocol::ProtocolError),

    /// Pool still exhausted after clearing it and retrying once
    #[error("waveform resources exhausted after clearing the pool")]
    HardwareExhausted,

    /// Transmission disabled after an earlier fatal hardware failure
    #[error("transmission halted after hardware exhaustion")]
    TransmitHalted,

    /// Hardware error
    #[error("hardware error: {0}")]
    Hardware(#[from] HardwareError),

    /// I/O error on the adapter streams
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
