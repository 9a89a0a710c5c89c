//! Bridge event loop
//!
//! Reads adapter lines one at a time and feeds them to the
//! [`DeviceController`], which is the only owner of the waveform hardware.
//! Feedback frames travel through a channel to a writer task that owns the
//! adapter's stdin.
//!
//! # Architecture
//!
//! ```text
//! cec-client stdout --lines--> run_bridge --> DeviceController --> hardware
//!                                                   |
//!                                              feedback_tx
//!                                                   v
//! cec-client stdin  <--frames-- feedback writer task
//! ```
//!
//! A line is fully handled, including settle delays and pacing, before the
//! next one is read, so events keep their arrival order.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::controller::DeviceController;
use crate::error::BridgeError;
use crate::hardware::WaveHardware;
use crate::state::{DeviceState, Feedback};

/// Feedback channel capacity
const FEEDBACK_CAPACITY: usize = 64;

/// Why the bridge loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The adapter closed its output (process exited)
    EndOfStream,
    /// Shutdown was requested
    Shutdown,
}

/// Result of a bridge run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSummary {
    /// Why the loop stopped
    pub reason: StopReason,
    /// Lines read from the adapter
    pub lines: u64,
    /// Lines that classified as a known event
    pub recognized: u64,
    /// Amplifier state at exit
    pub state: DeviceState,
}

/// Run the bridge until end of stream or shutdown
///
/// The hardware pool is cleared before returning on every path, including
/// read errors. Lines that are not valid UTF-8 are decoded lossily and
/// classified like any other line.
///
/// # Arguments
///
/// * `lines` - Adapter output
/// * `sink` - Adapter input for feedback frames
/// * `config` - Bridge configuration
/// * `hw` - Waveform hardware
/// * `shutdown_rx` - Oneshot receiver for shutdown signal
pub async fn run_bridge<R, W, H>(
    lines: R,
    sink: W,
    config: BridgeConfig,
    hw: H,
    shutdown_rx: oneshot::Receiver<()>,
) -> Result<BridgeSummary, BridgeError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
    H: WaveHardware,
{
    let (feedback_tx, feedback_rx) = mpsc::channel(FEEDBACK_CAPACITY);
    let writer = tokio::spawn(run_feedback_writer(sink, feedback_rx));

    let mut controller = DeviceController::new(config, hw, feedback_tx);
    let result = match controller.start().await {
        Ok(()) => drive(lines, &mut controller, shutdown_rx).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = controller.shutdown().await {
        warn!("Failed to release waveforms: {}", e);
    }

    // Dropping the controller closes the feedback channel and ends the writer
    let state = controller.state();
    drop(controller);
    if let Err(e) = writer.await {
        warn!("Feedback writer task failed: {}", e);
    }

    result.map(|(reason, lines, recognized)| BridgeSummary {
        reason,
        lines,
        recognized,
        state,
    })
}

async fn drive<R, H>(
    mut reader: R,
    controller: &mut DeviceController<H>,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> Result<(StopReason, u64, u64), BridgeError>
where
    R: AsyncBufRead + Unpin,
    H: WaveHardware,
{
    // Kept across iterations: a cancelled read leaves a partial line here
    let mut buf = Vec::new();
    let mut count = 0u64;
    let mut recognized = 0u64;
    // A dropped shutdown sender means nobody can ask us to stop
    let mut shutdown_armed = true;

    info!("Bridge running");

    loop {
        let read = tokio::select! {
            signal = &mut shutdown_rx, if shutdown_armed => {
                if signal.is_ok() {
                    info!("Bridge shutdown requested");
                    return Ok((StopReason::Shutdown, count, recognized));
                }
                shutdown_armed = false;
                continue;
            }
            read = reader.read_until(b'\n', &mut buf) => read?,
        };

        if read == 0 && buf.is_empty() {
            info!("Adapter output closed");
            return Ok((StopReason::EndOfStream, count, recognized));
        }

        // Adapter output carries OSD names and vendor strings verbatim
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);

        count += 1;
        if controller.handle_line(line).await.is_recognized() {
            recognized += 1;
        }
        buf.clear();
    }
}

/// Write feedback frames to the adapter until the channel closes
pub async fn run_feedback_writer<W>(mut sink: W, mut feedback_rx: mpsc::Receiver<Feedback>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(feedback) = feedback_rx.recv().await {
        let frame = format!("{}\n", feedback.frame());
        debug!("Writing '{}' to adapter", feedback);

        if let Err(e) = sink.write_all(frame.as_bytes()).await {
            warn!("Adapter write error: {}", e);
            continue;
        }
        if let Err(e) = sink.flush().await {
            warn!("Adapter flush error: {}", e);
        }
    }

    let _ = sink.shutdown().await;
}
