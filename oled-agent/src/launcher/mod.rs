//! LibreHardwareMonitor auto-start
//!
//! Handles:
//! - Readiness check of the sensor web server
//! - Spawning the configured executable when it is not running
//! - Waiting for the sensor tree to become available

use crate::config::{AgentConfig, LauncherConfig};
use crate::transport::HttpTransport;
use anyhow::{Context, Result};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command as AsyncCommand;
use tracing::{info, warn};

/// Result of a start attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    Disabled,
    AlreadyRunning,
    MissingExecutable,
    Started,
}

pub struct SensorLauncher<T> {
    transport: T,
    config: LauncherConfig,
    data_url: String,
    timeout: Duration,
}

impl<T: HttpTransport> SensorLauncher<T> {
    pub fn new(transport: T, config: &AgentConfig) -> Self {
        Self {
            transport,
            config: config.launcher.clone(),
            data_url: config.sensors.data_url(),
            timeout: config.sensors.timeout(),
        }
    }

    /// Sensor server answers with a sensor tree
    pub async fn is_ready(&self) -> bool {
        match self.transport.get_json(&self.data_url, self.timeout).await {
            Ok(tree) => tree.get("Children").is_some(),
            Err(_) => false,
        }
    }

    /// Spawn the sensor provider unless disabled or already serving
    pub async fn start_if_needed(&self) -> Result<LaunchOutcome> {
        if !self.config.auto_start {
            return Ok(LaunchOutcome::Disabled);
        }
        if self.is_ready().await {
            return Ok(LaunchOutcome::AlreadyRunning);
        }

        let executable = match &self.config.executable {
            Some(path) if path.exists() => path,
            Some(path) => {
                warn!("Sensor provider executable not found: {}", path.display());
                return Ok(LaunchOutcome::MissingExecutable);
            }
            None => {
                warn!("launcher.auto_start is set but launcher.executable is not");
                return Ok(LaunchOutcome::MissingExecutable);
            }
        };

        info!("Starting sensor provider: {}", executable.display());
        AsyncCommand::new(executable)
            .args(&self.config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start {}", executable.display()))?;

        Ok(LaunchOutcome::Started)
    }

    /// Poll once per second until ready or `limit` elapses
    pub async fn wait_until_ready(&self, limit: Duration) -> bool {
        let start = Instant::now();
        loop {
            if self.is_ready().await {
                info!("Sensor provider ready at {}", self.data_url);
                return true;
            }
            if start.elapsed() >= limit {
                warn!("Sensor provider not ready after {}s", limit.as_secs());
                return false;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    /// Startup sequence: start if configured, then wait for readiness
    pub async fn prepare(&self) -> Result<LaunchOutcome> {
        let outcome = self.start_if_needed().await?;
        if outcome == LaunchOutcome::Started {
            self.wait_until_ready(Duration::from_secs(self.config.wait_secs))
                .await;
        }
        Ok(outcome)
    }
}
