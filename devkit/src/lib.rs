/*!
# OLED DevKit - Stubs et Utilitaires pour Développement

Bibliothèque facilitant le développement et les tests de l'agent OLED avec:
- Transport HTTP simulé (GameSense + LibreHardwareMonitor) sans service réel
- Arbres de capteurs LHM prêts à l'emploi
- Harness de test avec `coreProps.json` temporaire
*/

pub mod gamesense_stub;
pub mod lhm_fixtures;
pub mod test_utils;

pub use gamesense_stub::{MockTransport, StubFailure};
pub use lhm_fixtures::{cpu_only_tree, desktop_tree, LhmTreeBuilder};
pub use test_utils::TestHarness;
