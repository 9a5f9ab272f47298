//! # Signed-Delivery Service
//!
//! ## Startup Sequence
//!
//! 1. Load telemetry configuration and install logging and metrics
//! 2. Load and validate runtime configuration
//! 3. Open file-backed adapters under `SD_DATA_DIR`
//! 4. Start the retry sweeper
//! 5. Run until Ctrl+C, then stop the sweeper

use anyhow::{Context, Result};
use delivery_runtime::{DeliveryRuntime, RuntimeConfig};
use delivery_telemetry::{init_telemetry, TelemetryConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    let _telemetry = init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    let config = RuntimeConfig::from_env().context("Invalid runtime configuration")?;

    info!("===========================================");
    info!("  Signed-Delivery v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let runtime = DeliveryRuntime::open(config)
        .await
        .context("Failed to open delivery storage")?;
    info!("Data Dir: {}", runtime.config.data_dir.display());
    info!("Public URL: {}", runtime.config.finalization.public_base_url);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let sweeper = tokio::spawn(runtime.sweeper().run(shutdown_rx));

    info!("Service is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    info!("Initiating graceful shutdown...");
    if let Err(e) = shutdown_tx.send(true) {
        error!("Failed to send shutdown signal: {}", e);
    }
    if let Err(e) = sweeper.await {
        error!("Sweeper task failed: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}
