//! Sensor-tree extraction policy
//!
//! LibreHardwareMonitor exposes a nested tree of `{Text, Value, Children}`
//! nodes. Leaf sensors are found by walking the tree; a sensor's category is
//! the `Text` of its parent node ("Temperatures", "Load", "Clocks", ...).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One way of locating a reading in the sensor tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRule {
    /// Parent node `Text`, any category when absent
    #[serde(default)]
    pub category: Option<String>,
    /// Sensor `Text`, compared case-insensitively
    pub label: String,
    /// Substring the value must contain, e.g. `"°C"` or `"MHz"`
    #[serde(default)]
    pub unit: Option<String>,
    /// Factor applied to the parsed value (GB -> MB is 1024)
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl SensorRule {
    pub fn new(label: &str, unit: &str) -> Self {
        Self {
            category: None,
            label: label.to_string(),
            unit: Some(unit.to_string()),
            scale: 1.0,
        }
    }

    pub fn in_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn scaled(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    fn matches(&self, sensor: &SensorNode<'_>) -> bool {
        if !sensor.label.trim().eq_ignore_ascii_case(self.label.trim()) {
            return false;
        }
        if let Some(category) = &self.category {
            match sensor.category {
                Some(parent) if parent.trim().eq_ignore_ascii_case(category.trim()) => {}
                _ => return false,
            }
        }
        if let Some(unit) = &self.unit {
            let raw = match sensor.value {
                Value::String(s) => s.to_lowercase(),
                // Bare numbers carry no unit; accept them
                _ => return true,
            };
            if !raw.contains(&unit.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// Ordered rules per snapshot field; the first rule that matches wins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionPolicy {
    pub cpu_clock: Vec<SensorRule>,
    pub cpu_load: Vec<SensorRule>,
    pub cpu_temp: Vec<SensorRule>,
    pub gpu_load: Vec<SensorRule>,
    pub gpu_temp: Vec<SensorRule>,
    pub vram_used: Vec<SensorRule>,
    pub vram_total: Vec<SensorRule>,
    pub ram_used: Vec<SensorRule>,
    pub ram_available: Vec<SensorRule>,
}

impl Default for ExtractionPolicy {
    /// Sensor names used by LibreHardwareMonitor
    fn default() -> Self {
        Self {
            cpu_clock: vec![SensorRule::new("Cores (Average)", "MHz")],
            cpu_load: vec![SensorRule::new("CPU Total", "%")],
            cpu_temp: vec![
                SensorRule::new("Core (Tctl/Tdie)", "°C"),
                SensorRule::new("CPU Package", "°C"),
            ],
            gpu_load: vec![
                SensorRule::new("D3D 3D", "%"),
                SensorRule::new("GPU Core", "%"),
            ],
            gpu_temp: vec![
                SensorRule::new("GPU Core", "°C"),
                SensorRule::new("GPU Hot Spot", "°C"),
            ],
            vram_used: vec![SensorRule::new("GPU Memory Used", "MB")],
            vram_total: vec![SensorRule::new("GPU Memory Total", "MB")],
            ram_used: vec![SensorRule::new("Memory Used", "GB").scaled(1024.0)],
            ram_available: vec![SensorRule::new("Memory Available", "GB").scaled(1024.0)],
        }
    }
}

/// A leaf of the sensor tree
#[derive(Debug)]
pub struct SensorNode<'a> {
    pub category: Option<&'a str>,
    pub label: &'a str,
    pub value: &'a Value,
}

impl ExtractionPolicy {
    /// First reading matching `rules`, in rule priority order
    pub fn lookup(rules: &[SensorRule], sensors: &[SensorNode<'_>]) -> Option<f64> {
        rules.iter().find_map(|rule| {
            sensors
                .iter()
                .filter(|sensor| rule.matches(sensor))
                .find_map(|sensor| parse_reading(sensor.value))
                .map(|reading| reading * rule.scale)
        })
    }
}

/// Flatten the tree into its sensor leaves, depth-first
pub fn collect_sensors(tree: &Value) -> Vec<SensorNode<'_>> {
    let mut sensors = Vec::new();
    walk(tree, None, &mut sensors);
    sensors
}

fn walk<'a>(node: &'a Value, parent: Option<&'a str>, out: &mut Vec<SensorNode<'a>>) {
    match node {
        Value::Object(map) => {
            let label = map.get("Text").and_then(Value::as_str);
            if let (Some(label), Some(value)) = (label, map.get("Value")) {
                if parse_reading(value).is_some() {
                    out.push(SensorNode { category: parent, label, value });
                }
            }
            for child in map.values() {
                walk(child, label.or(parent), out);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, parent, out);
            }
        }
        _ => {}
    }
}

/// Numeric part of a reading such as `"52,6 °C"` or `"6.3 %"`
pub fn parse_reading(value: &Value) -> Option<f64> {
    let reading = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let number: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
                .collect();
            if number.is_empty() {
                return None;
            }
            number.replace(',', ".").parse().ok()?
        }
        _ => return None,
    };
    reading.is_finite().then_some(reading)
}
