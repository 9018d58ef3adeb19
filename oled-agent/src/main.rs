//! Apex OLED agent entry point

use anyhow::{Context, Result};
use oled_agent::launcher::SensorLauncher;
use oled_agent::{logging, AgentConfig, ReqwestTransport, RotationScheduler};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AgentConfig::load()
        .await
        .context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    logging::init(&config.logging).context("Failed to initialize logging")?;

    info!("🖥️ Apex OLED agent v{} starting...", env!("CARGO_PKG_VERSION"));
    if config.gamesense.discovery_paths.is_empty() {
        warn!("No GameSense discovery paths configured; the display will never bind");
    }

    let transport = ReqwestTransport::new();

    let launcher = SensorLauncher::new(transport.clone(), &config);
    match launcher.prepare().await {
        Ok(outcome) => info!("Sensor provider: {:?}", outcome),
        Err(e) => error!("Sensor provider auto-start failed: {:#}", e),
    }

    let mut scheduler = RotationScheduler::from_config(&config, transport);
    scheduler.run(shutdown_signal()).await;

    info!("👋 Apex OLED agent stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
