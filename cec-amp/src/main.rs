//! CEC to RC-5 Amplifier Bridge
//!
//! Runs on a Raspberry Pi between `cec-client` and `pigpiod`: HDMI-CEC power
//! and volume events from the TV become RC-5 commands on a GPIO pin, and
//! volume feedback is reported back to the TV.

mod adapter;
mod settings;

use std::process::ExitCode;

use cec_bridge::{run_bridge, BridgeError, BridgeSummary, HardwareError, PigpioClient};
use rc5_protocol::{AmpCommand, ControlWord};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adapter::{AdapterError, AdapterProcess};
use settings::Settings;

#[derive(Debug, Error)]
enum AppError {
    #[error("could not connect to pigpiod: {0}")]
    Pigpio(#[source] HardwareError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("bridge failed: {0}")]
    Bridge(#[from] BridgeError),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cec_rc5=info,cec_bridge=info,rc5_protocol=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cec-rc5 bridge");

    let settings = load_settings();

    match run(settings).await {
        Ok(summary) => {
            info!(
                "Bridge stopped ({:?}) after {} lines, {} recognized, amp {:?}",
                summary.reason, summary.lines, summary.recognized, summary.state.amp_power
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load settings, writing the defaults on first run so they can be edited
fn load_settings() -> Settings {
    let exists = Settings::settings_path().is_some_and(|path| path.exists());
    let settings = Settings::load();

    if !exists {
        match settings.save() {
            Ok(path) => info!("Wrote default settings to {}", path.display()),
            Err(e) => warn!("Could not write default settings: {}", e),
        }
    }

    settings
}

async fn run(settings: Settings) -> Result<BridgeSummary, AppError> {
    let config = settings.bridge;
    for cmd in AmpCommand::ALL {
        debug!(
            "{:<8} -> {}",
            cmd.name(),
            ControlWord::encode(config.system_id, cmd.code())
        );
    }

    let hw = PigpioClient::connect(&settings.pigpio.host, settings.pigpio.port)
        .await
        .map_err(AppError::Pigpio)?;

    let (child, stdout, stdin) = AdapterProcess::spawn(&settings.adapter)?.into_parts();

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(());
    });

    let result = run_bridge(stdout, stdin, config, hw, shutdown_rx).await;
    adapter::stop(child).await;

    Ok(result?)
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!("Could not listen for SIGTERM: {}", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Could not listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            return;
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("Could not listen for Ctrl-C: {}", e);
                terminate.recv().await;
            }
        }
        _ = terminate.recv() => {}
    }
    info!("Shutdown signal received");
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Could not listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
