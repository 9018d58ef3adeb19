/*!
Test Harness pour l'agent OLED

Facilite l'écriture de tests d'intégration avec:
- Fichier `coreProps.json` temporaire (publication / retrait du port GameSense)
- Transport simulé partagé par tous les composants
- Construction des composants à partir d'une config de test
- Assertions sur les requêtes GameSense émises
*/

use crate::gamesense_stub::MockTransport;
use anyhow::{bail, Result};
use oled_agent::config::{AgentConfig, RamSource};
use oled_agent::display::GAME_EVENT_ROUTE;
use oled_agent::session::{BIND_EVENT_ROUTE, GAME_METADATA_ROUTE};
use oled_agent::{
    DisplayDriver, MetricSource, PortResolver, RotationScheduler, SessionBinder, TickReport,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;

/// URL de base du serveur de capteurs simulé
pub const SENSORS_URL: &str = "http://sensors.test";

/// Harness de test complet pour l'agent
pub struct TestHarness {
    pub transport: MockTransport,
    pub config: AgentConfig,
    dir: TempDir,
}

impl TestHarness {
    /// Crée un nouveau harness: aucun port publié, aucun capteur servi
    pub fn new() -> Self {
        env_logger::try_init().ok(); // Init logging pour tests

        let dir = TempDir::new().expect("failed to create temp dir");
        let mut config = AgentConfig::default();
        config.sensors.base_url = SENSORS_URL.to_string();
        config.sensors.ram_source = RamSource::Sensors;
        config.gamesense.discovery_paths = vec![dir.path().join("coreProps.json")];
        config.rotation.tick_ms = 10;

        Self {
            transport: MockTransport::new(),
            config,
            dir,
        }
    }

    pub fn core_props_path(&self) -> PathBuf {
        self.dir.path().join("coreProps.json")
    }

    /// Simule SteelSeries GG qui publie son adresse
    pub fn publish_address(&self, address: &str) {
        let props = json!({
            "address": address,
            "encrypted_address": "127.0.0.1:61235",
        });
        self.write_core_props_raw(&props.to_string());
        log::info!("📡 Published GameSense address {}", address);
    }

    /// Écrit le fichier tel quel (pour les cas malformés)
    pub fn write_core_props_raw(&self, contents: &str) {
        std::fs::write(self.core_props_path(), contents).expect("failed to write coreProps.json");
    }

    /// Simule l'arrêt de SteelSeries GG
    pub fn withdraw_address(&self) {
        let _ = std::fs::remove_file(self.core_props_path());
        log::info!("🔌 Withdrew GameSense address");
    }

    pub fn resolver(&self) -> PortResolver {
        PortResolver::new(self.config.gamesense.discovery_paths.clone())
    }

    pub fn binder(&self) -> SessionBinder<MockTransport> {
        SessionBinder::new(self.resolver(), self.transport.clone(), &self.config.gamesense)
    }

    pub fn display(&self) -> DisplayDriver<MockTransport> {
        DisplayDriver::new(self.binder(), self.transport.clone(), &self.config.gamesense)
    }

    pub fn metric_source(&self) -> MetricSource<MockTransport> {
        MetricSource::new(self.transport.clone(), &self.config.sensors)
    }

    pub fn scheduler(&self) -> RotationScheduler<MockTransport> {
        RotationScheduler::from_config(&self.config, self.transport.clone())
    }

    /// Exécute `count` ticks et retourne leurs rapports
    pub async fn run_ticks(
        &self,
        scheduler: &mut RotationScheduler<MockTransport>,
        count: usize,
    ) -> Vec<TickReport> {
        let mut reports = Vec::with_capacity(count);
        for _ in 0..count {
            reports.push(scheduler.tick().await);
        }
        reports
    }

    /// Nombre d'enregistrements complets (metadata + bind) envoyés
    pub fn registrations_sent(&self) -> usize {
        self.transport
            .count(GAME_METADATA_ROUTE)
            .min(self.transport.count(BIND_EVENT_ROUTE))
    }

    /// Frames (`data.frame`) de tous les `game_event` émis, dans l'ordre
    pub fn pushed_frames(&self) -> Vec<Value> {
        self.transport
            .requests_to(GAME_EVENT_ROUTE)
            .into_iter()
            .filter_map(|r| r.body)
            .map(|body| body["data"]["frame"].clone())
            .collect()
    }

    /// Vérifie qu'un `game_event` a été envoyé au port attendu
    pub fn assert_pushed_to(&self, address: &str) -> Result<()> {
        let expected = format!("http://{}{}", address, GAME_EVENT_ROUTE);
        let requests = self.transport.requests_to(GAME_EVENT_ROUTE);
        match requests.last() {
            Some(last) if last.url == expected => {
                log::info!("✅ Last frame pushed to {}", address);
                Ok(())
            }
            Some(last) => bail!("last frame pushed to {}, expected {}", last.url, expected),
            None => bail!("no frame pushed, expected one at {}", expected),
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
