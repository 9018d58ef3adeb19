/*!
Arbres de capteurs LibreHardwareMonitor pour les tests

Construit des réponses `data.json` réalistes:
- Arbre complet d'un poste de bureau (CPU + GPU dédié + RAM)
- Machine sans GPU (graphique intégré sans capteurs)
- Builder pour composer des arbres sur mesure
*/

use serde_json::{json, Value};

/// Builder d'arbre `{Text, Value, Children}` au format LHM
pub struct LhmTreeBuilder {
    machine: String,
    hardware: Vec<Value>,
}

impl LhmTreeBuilder {
    pub fn new(machine: &str) -> Self {
        Self {
            machine: machine.to_string(),
            hardware: Vec::new(),
        }
    }

    /// Ajoute un composant matériel avec ses groupes de capteurs
    pub fn hardware(mut self, name: &str, groups: Vec<Value>) -> Self {
        self.hardware.push(node(name, "", groups));
        self
    }

    pub fn build(self) -> Value {
        node(
            "Sensor",
            "Value",
            vec![node(&self.machine, "", self.hardware)],
        )
    }
}

/// Groupe de capteurs ("Temperatures", "Load", "Clocks", ...)
pub fn group(category: &str, sensors: &[(&str, &str)]) -> Value {
    let children = sensors
        .iter()
        .map(|(label, value)| node(label, value, Vec::new()))
        .collect();
    node(category, "", children)
}

fn node(text: &str, value: &str, children: Vec<Value>) -> Value {
    json!({
        "Text": text,
        "Value": value,
        "Children": children,
    })
}

fn cpu(clock: &str, load: &str, temp: &str) -> Vec<Value> {
    vec![
        group("Clocks", &[("Core #1", "4350.0 MHz"), ("Cores (Average)", clock)]),
        group("Temperatures", &[("Core (Tctl/Tdie)", temp)]),
        group("Load", &[("CPU Total", load), ("Core Max", "31.0 %")]),
    ]
}

fn memory(used_gb: &str, available_gb: &str) -> Vec<Value> {
    vec![
        group("Load", &[("Memory", "38.6 %")]),
        group(
            "Data",
            &[("Memory Used", used_gb), ("Memory Available", available_gb)],
        ),
    ]
}

/// Poste de bureau: CPU 4200 MHz / 12 % / 52.6 °C, GPU 35 % / 61 °C,
/// VRAM 2048/8192 MB, RAM 12.3 GB utilisés sur 31.9 GB
pub fn desktop_tree() -> Value {
    LhmTreeBuilder::new("DESKTOP-TEST")
        .hardware("AMD Ryzen 7 5800X", cpu("4200.0 MHz", "12.4 %", "52.6 °C"))
        .hardware("Generic Memory", memory("12.3 GB", "19.6 GB"))
        .hardware(
            "NVIDIA GeForce RTX 3070",
            vec![
                group("Temperatures", &[("GPU Core", "61.0 °C"), ("GPU Hot Spot", "72.4 °C")]),
                group("Load", &[("GPU Core", "40.0 %"), ("D3D 3D", "35.0 %")]),
                group(
                    "Data",
                    &[("GPU Memory Used", "2048.0 MB"), ("GPU Memory Total", "8192.0 MB")],
                ),
            ],
        )
        .build()
}

/// Même poste avec une charge CPU différente (pour distinguer deux relevés)
pub fn desktop_tree_with_cpu_load(load: &str) -> Value {
    LhmTreeBuilder::new("DESKTOP-TEST")
        .hardware("AMD Ryzen 7 5800X", cpu("4200.0 MHz", load, "52.6 °C"))
        .hardware("Generic Memory", memory("12.3 GB", "19.6 GB"))
        .build()
}

/// Portable sans capteur GPU
pub fn cpu_only_tree() -> Value {
    LhmTreeBuilder::new("LAPTOP-TEST")
        .hardware("Intel Core i5-1135G7", cpu("2400.0 MHz", "8.0 %", "47.0 °C"))
        .hardware("Generic Memory", memory("6.0 GB", "10.0 GB"))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use oled_agent::metrics::{collect_sensors, ExtractionPolicy, SensorSnapshot};

    #[test]
    fn test_desktop_tree_extracts() {
        let snapshot = SensorSnapshot::from_tree(
            &desktop_tree(),
            &ExtractionPolicy::default(),
            chrono::Utc::now(),
        );

        assert_eq!(snapshot.cpu.clock_mhz, Some(4200.0));
        assert_eq!(snapshot.gpu.load_pct, Some(35.0));
        assert_eq!(snapshot.gpu.temp_c, Some(61.0));
        assert_eq!(snapshot.gpu.vram_total_mb, Some(8192.0));
    }

    #[test]
    fn test_builder_categories() {
        let tree = LhmTreeBuilder::new("BOX")
            .hardware("CPU", vec![group("Load", &[("CPU Total", "5.0 %")])])
            .build();
        let sensors = collect_sensors(&tree);

        assert_eq!(sensors.len(), 1);
        assert_eq!(sensors[0].category, Some("Load"));
        assert_eq!(sensors[0].label, "CPU Total");
    }
}
