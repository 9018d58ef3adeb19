//! Sensor snapshots from LibreHardwareMonitor
//!
//! Provides:
//! - CPU clock, load and temperature
//! - GPU load, temperature and VRAM usage
//! - RAM usage (from the OS or from the sensor tree)
//!
//! Fetching never fails: a timeout, connection error or undecodable tree
//! degrades to the last good snapshot marked invalid.

mod extract;

pub use extract::{collect_sensors, parse_reading, ExtractionPolicy, SensorNode, SensorRule};

use crate::config::{RamSource, SensorConfig};
use crate::transport::{HttpTransport, TransportError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use sysinfo::System;
use thiserror::Error;
use tracing::{debug, info, warn};

/// CPU readings, `None` when the sensor is unavailable
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CpuReadings {
    pub clock_mhz: Option<f64>,
    pub load_pct: Option<f64>,
    pub temp_c: Option<f64>,
}

/// GPU readings
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GpuReadings {
    pub load_pct: Option<f64>,
    pub temp_c: Option<f64>,
    pub vram_used_mb: Option<f64>,
    pub vram_total_mb: Option<f64>,
}

impl GpuReadings {
    /// No GPU sensor at all (e.g. integrated graphics without sensors)
    pub fn is_absent(&self) -> bool {
        self.load_pct.is_none()
            && self.temp_c.is_none()
            && self.vram_used_mb.is_none()
            && self.vram_total_mb.is_none()
    }
}

/// Memory usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RamReadings {
    pub used_mb: Option<f64>,
    pub total_mb: Option<f64>,
}

/// One poll of the sensor source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSnapshot {
    pub cpu: CpuReadings,
    pub gpu: GpuReadings,
    pub ram: RamReadings,
    pub fetched_at: DateTime<Utc>,
    /// False when the fetch behind this snapshot failed
    pub valid: bool,
}

impl SensorSnapshot {
    /// Invalid snapshot with every reading unavailable
    pub fn unavailable(at: DateTime<Utc>) -> Self {
        Self {
            cpu: CpuReadings::default(),
            gpu: GpuReadings::default(),
            ram: RamReadings::default(),
            fetched_at: at,
            valid: false,
        }
    }

    /// Apply `policy` to a decoded sensor tree
    pub fn from_tree(tree: &Value, policy: &ExtractionPolicy, at: DateTime<Utc>) -> Self {
        let sensors = collect_sensors(tree);
        let read = |rules: &[SensorRule]| ExtractionPolicy::lookup(rules, &sensors);

        let ram_used = read(&policy.ram_used);
        let ram_total = match (ram_used, read(&policy.ram_available)) {
            (Some(used), Some(available)) => Some(used + available),
            _ => None,
        };

        Self {
            cpu: CpuReadings {
                clock_mhz: read(&policy.cpu_clock),
                load_pct: read(&policy.cpu_load),
                temp_c: read(&policy.cpu_temp),
            },
            gpu: GpuReadings {
                load_pct: read(&policy.gpu_load),
                temp_c: read(&policy.gpu_temp),
                vram_used_mb: read(&policy.vram_used),
                vram_total_mb: read(&policy.vram_total),
            },
            ram: RamReadings {
                used_mb: ram_used,
                total_mb: ram_total,
            },
            fetched_at: at,
            valid: true,
        }
    }

    /// Same readings, marked invalid
    fn degraded(&self, at: DateTime<Utc>) -> Self {
        Self {
            fetched_at: at,
            valid: false,
            ..self.clone()
        }
    }
}

#[derive(Debug, Error)]
enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("response is not a sensor tree (no \"Children\")")]
    NotASensorTree,
}

/// Polls the sensor HTTP source
pub struct MetricSource<T> {
    transport: T,
    url: String,
    timeout: Duration,
    policy: ExtractionPolicy,
    ram_source: RamSource,
    system: System,
    last_good: Option<SensorSnapshot>,
    failing: bool,
}

impl<T: HttpTransport> MetricSource<T> {
    pub fn new(transport: T, config: &SensorConfig) -> Self {
        Self {
            transport,
            url: config.data_url(),
            timeout: config.timeout(),
            policy: config.rules.clone(),
            ram_source: config.ram_source,
            system: System::new(),
            last_good: None,
            failing: false,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Latest snapshot; degraded rather than failed when the source is down
    pub async fn fetch(&mut self) -> SensorSnapshot {
        let now = Utc::now();

        let mut snapshot = match self.fetch_tree().await {
            Ok(tree) => {
                if self.failing {
                    info!("Sensor source recovered at {}", self.url);
                    self.failing = false;
                }
                SensorSnapshot::from_tree(&tree, &self.policy, now)
            }
            Err(e) => {
                if self.failing {
                    debug!("Sensor fetch still failing: {}", e);
                } else {
                    warn!("Sensor fetch failed: {}", e);
                    self.failing = true;
                }
                match &self.last_good {
                    Some(previous) => previous.degraded(now),
                    None => SensorSnapshot::unavailable(now),
                }
            }
        };

        if self.ram_source == RamSource::Os {
            snapshot.ram = self.os_memory();
        }
        if snapshot.valid {
            self.last_good = Some(snapshot.clone());
        }
        snapshot
    }

    async fn fetch_tree(&self) -> Result<Value, FetchError> {
        let tree = self.transport.get_json(&self.url, self.timeout).await?;
        if tree.get("Children").is_none() {
            return Err(FetchError::NotASensorTree);
        }
        Ok(tree)
    }

    fn os_memory(&mut self) -> RamReadings {
        self.system.refresh_memory();
        let total_bytes = self.system.total_memory();
        if total_bytes == 0 {
            return RamReadings::default();
        }
        let used_bytes = total_bytes.saturating_sub(self.system.available_memory());

        // Convert bytes to MB (divide by 1024^2)
        RamReadings {
            used_mb: Some(used_bytes as f64 / (1024.0 * 1024.0)),
            total_mb: Some(total_bytes as f64 / (1024.0 * 1024.0)),
        }
    }
}
