//! Configuration management
//!
//! Handles:
//! - Sensor source URL, timeout and extraction rules
//! - GameSense discovery paths and game/event identity
//! - Rotation cadence and page layout
//! - Optional LibreHardwareMonitor auto-start
//! - Log level and log file
//!
//! Read once at startup from TOML; a missing file means defaults.

use crate::metrics::ExtractionPolicy;
use crate::pages::PageLayout;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "APEX_OLED_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub sensors: SensorConfig,
    pub gamesense: GameSenseConfig,
    pub rotation: RotationConfig,
    pub launcher: LauncherConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// LibreHardwareMonitor remote web server, `/data.json` is appended
    pub base_url: String,
    pub timeout_ms: u64,
    pub ram_source: RamSource,
    pub rules: ExtractionPolicy,
}

/// Where RAM usage comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RamSource {
    /// Physical memory reported by the OS
    Os,
    /// `ram_used` / `ram_available` extraction rules
    Sensors,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSenseConfig {
    /// Candidate `coreProps.json` locations, first valid one wins
    pub discovery_paths: Vec<PathBuf>,
    pub game: String,
    pub game_display_name: String,
    pub developer: String,
    pub event: String,
    pub icon_id: u32,
    pub device_type: String,
    pub deinitialize_timer_ms: u64,
    pub timeout_ms: u64,
    /// OLED line width in characters
    pub max_line_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub tick_ms: u64,
    pub bar_width: usize,
    pub temp_suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub auto_start: bool,
    pub executable: Option<PathBuf>,
    pub args: Vec<String>,
    pub wait_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8085".to_string(),
            timeout_ms: 2000,
            ram_source: RamSource::Os,
            rules: ExtractionPolicy::default(),
        }
    }
}

impl Default for GameSenseConfig {
    fn default() -> Self {
        Self {
            discovery_paths: default_discovery_paths(),
            game: "LHM_OLED".to_string(),
            game_display_name: "LHM OLED Monitor".to_string(),
            developer: "local".to_string(),
            event: "OLED_PAGE".to_string(),
            icon_id: 1,
            device_type: "screened-128x40".to_string(),
            deinitialize_timer_ms: 60_000,
            timeout_ms: 2000,
            max_line_chars: 18,
        }
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            tick_ms: 3000,
            bar_width: 16,
            temp_suffix: "°C".to_string(),
        }
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            auto_start: false,
            executable: None,
            args: Vec::new(),
            wait_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl SensorConfig {
    pub fn data_url(&self) -> String {
        format!("{}/data.json", self.base_url.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl GameSenseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl RotationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn layout(&self) -> PageLayout {
        PageLayout {
            bar_width: self.bar_width,
            temp_suffix: self.temp_suffix.clone(),
            ..PageLayout::default()
        }
    }
}

/// Known `coreProps.json` locations (they vary by Engine/GG version)
fn default_discovery_paths() -> Vec<PathBuf> {
    if cfg!(target_os = "windows") {
        let program_data = std::env::var_os("PROGRAMDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData"));
        ["SteelSeries Engine 3", "GG", "SteelSeries GG"]
            .iter()
            .map(|dir| program_data.join("SteelSeries").join(dir).join("coreProps.json"))
            .collect()
    } else if cfg!(target_os = "macos") {
        vec![
            PathBuf::from("/Library/Application Support/SteelSeries Engine 3/coreProps.json"),
            PathBuf::from("/Library/Application Support/SteelSeries GG/coreProps.json"),
        ]
    } else {
        Vec::new()
    }
}

impl AgentConfig {
    /// Load config from `APEX_OLED_CONFIG` or the OS-specific location
    pub async fn load() -> Result<Self> {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(path) => PathBuf::from(path),
            None => Self::config_file_path()?,
        };
        Self::load_from(&path).await
    }

    /// Load config from an explicit path, defaults when it does not exist
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: AgentConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get OS-specific config file path
    pub fn config_file_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;

        path.push("apex-oled");
        path.push("config.toml");
        Ok(path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sensors.base_url.trim().is_empty() {
            bail!("sensors.base_url must not be empty");
        }
        if self.sensors.timeout_ms == 0 || self.gamesense.timeout_ms == 0 {
            bail!("timeouts must be greater than zero");
        }
        if self.rotation.tick_ms == 0 {
            bail!("rotation.tick_ms must be greater than zero");
        }
        if self.rotation.bar_width == 0 {
            bail!("rotation.bar_width must be greater than zero");
        }
        if self.gamesense.max_line_chars == 0 {
            bail!("gamesense.max_line_chars must be greater than zero");
        }
        if self.gamesense.game.trim().is_empty() || self.gamesense.event.trim().is_empty() {
            bail!("gamesense.game and gamesense.event must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.sensors.data_url(), "http://localhost:8085/data.json");
        assert_eq!(config.sensors.ram_source, RamSource::Os);
        assert_eq!(config.gamesense.game, "LHM_OLED");
        assert_eq!(config.gamesense.max_line_chars, 18);
        assert_eq!(config.rotation.tick_interval(), Duration::from_secs(3));
        assert!(!config.launcher.auto_start);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_path() {
        let path = AgentConfig::config_file_path().unwrap();
        assert!(path.to_string_lossy().contains("apex-oled"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AgentConfig::parse(
            r#"
            [sensors]
            base_url = "http://192.168.1.20:8085/"
            ram_source = "sensors"

            [rotation]
            tick_ms = 1000

            [logging]
            file = "oled.log"
            "#,
        )
        .unwrap();

        assert_eq!(config.sensors.data_url(), "http://192.168.1.20:8085/data.json");
        assert_eq!(config.sensors.ram_source, RamSource::Sensors);
        assert_eq!(config.sensors.timeout_ms, 2000);
        assert_eq!(config.rotation.tick_ms, 1000);
        assert_eq!(config.rotation.bar_width, 16);
        assert_eq!(config.gamesense.event, "OLED_PAGE");
        assert_eq!(config.logging.file, Some(PathBuf::from("oled.log")));
        assert!(!config.sensors.rules.cpu_temp.is_empty());
    }

    #[test]
    fn test_custom_extraction_rules() {
        let config = AgentConfig::parse(
            r#"
            [sensors.rules]
            cpu_temp = [{ label = "CPU Package", unit = "°C" }]
            "#,
        )
        .unwrap();

        assert_eq!(config.sensors.rules.cpu_temp.len(), 1);
        assert_eq!(config.sensors.rules.cpu_temp[0].label, "CPU Package");
        assert_eq!(config.sensors.rules.cpu_temp[0].scale, 1.0);
        // Untouched fields keep their default rules
        assert!(!config.sensors.rules.gpu_load.is_empty());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AgentConfig::parse("[rotation]\ntick_ms = 0").is_err());
        assert!(AgentConfig::parse("[rotation]\nbar_width = 0").is_err());
        assert!(AgentConfig::parse("[gamesense]\nevent = \"\"").is_err());
        assert!(AgentConfig::parse("[sensors]\ntimeout_ms = \"fast\"").is_err());
    }

    #[tokio::test]
    async fn test_missing_file_means_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = AgentConfig::load_from(&dir.path().join("config.toml")).await.unwrap();
        assert_eq!(config.gamesense.game, "LHM_OLED");
    }

    #[tokio::test]
    async fn test_load_from_file_and_env_override() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[gamesense]\ngame = \"APEX_TEST\"\n\n[rotation]\ntick_ms = 1500\n",
        )
        .unwrap();

        let config = AgentConfig::load_from(&path).await.unwrap();
        assert_eq!(config.gamesense.game, "APEX_TEST");
        assert_eq!(config.rotation.tick_interval(), Duration::from_millis(1500));
        assert_eq!(config.gamesense.event, "OLED_PAGE");

        // Only test touching the variable
        std::env::set_var(CONFIG_ENV, &path);
        let loaded = AgentConfig::load().await;
        std::env::remove_var(CONFIG_ENV);
        assert_eq!(loaded.unwrap().gamesense.game, "APEX_TEST");

        std::fs::write(&path, "[rotation]\ntick_ms = 0\n").unwrap();
        assert!(AgentConfig::load_from(&path).await.is_err());
    }
}
