//! Page layouts for the OLED screen
//!
//! Pure formatting: a snapshot and a page go in, at most [`MAX_LINES`] text
//! lines come out. Unavailable readings render as [`UNAVAILABLE`] rather than
//! a misleading zero.

use crate::metrics::SensorSnapshot;

/// Lines bound per screen (context-frame keys `l1`..`l3`)
pub const MAX_LINES: usize = 3;

/// Placeholder for a missing reading
pub const UNAVAILABLE: &str = "--";

/// Rotating pages, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Page {
    Cpu,
    Gpu,
    Ram,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Cpu, Page::Gpu, Page::Ram];
    pub const COUNT: usize = Self::ALL.len();

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::COUNT]
    }

    pub fn index(self) -> usize {
        match self {
            Page::Cpu => 0,
            Page::Gpu => 1,
            Page::Ram => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Cpu => "CPU",
            Page::Gpu => "GPU",
            Page::Ram => "RAM",
        }
    }
}

/// Formatted screen, consumed by the display driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    pub lines: Vec<String>,
    pub page: Page,
}

/// Bar and unit settings
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub bar_width: usize,
    pub bar_filled: char,
    pub bar_empty: char,
    pub temp_suffix: String,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            bar_width: 16,
            bar_filled: '#',
            bar_empty: '-',
            temp_suffix: "°C".to_string(),
        }
    }
}

/// Render `page` from `snapshot`
pub fn format(snapshot: &SensorSnapshot, page: Page, layout: &PageLayout) -> RenderedFrame {
    let lines = match page {
        Page::Cpu => cpu_lines(snapshot, layout),
        Page::Gpu => gpu_lines(snapshot, layout),
        Page::Ram => ram_lines(snapshot, layout),
    };
    RenderedFrame { lines, page }
}

/// Shown before the first usable snapshot arrives
pub fn placeholder(page: Page) -> RenderedFrame {
    RenderedFrame {
        lines: vec![page.title().to_string(), "initializing...".to_string()],
        page,
    }
}

fn cpu_lines(snapshot: &SensorSnapshot, layout: &PageLayout) -> Vec<String> {
    let cpu = &snapshot.cpu;
    vec![
        format!("CPU {}MHz", whole(cpu.clock_mhz)),
        format!("Load {}% {}", whole(cpu.load_pct), temperature(cpu.temp_c, layout)),
    ]
}

fn gpu_lines(snapshot: &SensorSnapshot, layout: &PageLayout) -> Vec<String> {
    let gpu = &snapshot.gpu;
    if gpu.is_absent() {
        return vec!["No GPU".to_string()];
    }
    vec![
        format!("GPU {}% {}", whole(gpu.load_pct), temperature(gpu.temp_c, layout)),
        format!("VRAM {}/{}MB", whole(gpu.vram_used_mb), whole(gpu.vram_total_mb)),
        bar(gpu.vram_used_mb, gpu.vram_total_mb, layout),
    ]
}

fn ram_lines(snapshot: &SensorSnapshot, layout: &PageLayout) -> Vec<String> {
    let ram = &snapshot.ram;
    let gb = |mb: Option<f64>| mb.map(|mb| mb / 1024.0);
    vec![
        format!("RAM {}/{}GB", tenths(gb(ram.used_mb)), tenths(gb(ram.total_mb))),
        bar(ram.used_mb, ram.total_mb, layout),
    ]
}

fn whole(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}", v.round() as i64),
        None => UNAVAILABLE.to_string(),
    }
}

fn tenths(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => UNAVAILABLE.to_string(),
    }
}

fn temperature(value: Option<f64>, layout: &PageLayout) -> String {
    match value {
        Some(v) => format!("{:.1}{}", v, layout.temp_suffix),
        None => UNAVAILABLE.to_string(),
    }
}

/// Filled cells for `used / total` on a bar `width` cells wide
pub fn filled_cells(used: Option<f64>, total: Option<f64>, width: usize) -> usize {
    let (used, total) = match (used, total) {
        (Some(used), Some(total)) if total > 0.0 => (used, total),
        _ => return 0,
    };
    let fraction = used / total;
    if !fraction.is_finite() {
        return 0;
    }
    let cells = (fraction * width as f64).round();
    cells.clamp(0.0, width as f64) as usize
}

/// `[####------]`, empty when the total is zero or unknown
pub fn bar(used: Option<f64>, total: Option<f64>, layout: &PageLayout) -> String {
    let filled = filled_cells(used, total, layout.bar_width);
    let mut out = String::with_capacity(layout.bar_width + 2);
    out.push('[');
    out.extend(std::iter::repeat(layout.bar_filled).take(filled));
    out.extend(std::iter::repeat(layout.bar_empty).take(layout.bar_width - filled));
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{CpuReadings, GpuReadings, RamReadings};
    use chrono::Utc;

    fn snapshot() -> SensorSnapshot {
        SensorSnapshot {
            cpu: CpuReadings {
                clock_mhz: Some(4199.6),
                load_pct: Some(12.4),
                temp_c: Some(52.64),
            },
            gpu: GpuReadings {
                load_pct: Some(35.0),
                temp_c: Some(61.0),
                vram_used_mb: Some(2048.0),
                vram_total_mb: Some(8192.0),
            },
            ram: RamReadings {
                used_mb: Some(8192.0),
                total_mb: Some(32768.0),
            },
            fetched_at: Utc::now(),
            valid: true,
        }
    }

    #[test]
    fn test_cpu_page() {
        let frame = format(&snapshot(), Page::Cpu, &PageLayout::default());
        assert_eq!(frame.page, Page::Cpu);
        assert_eq!(frame.lines, vec!["CPU 4200MHz", "Load 12% 52.6°C"]);
    }

    #[test]
    fn test_gpu_page() {
        let frame = format(&snapshot(), Page::Gpu, &PageLayout::default());
        assert_eq!(
            frame.lines,
            vec!["GPU 35% 61.0°C", "VRAM 2048/8192MB", "[####------------]"]
        );
    }

    #[test]
    fn test_ram_page() {
        let frame = format(&snapshot(), Page::Ram, &PageLayout::default());
        assert_eq!(frame.lines, vec!["RAM 8.0/32.0GB", "[####------------]"]);
    }

    #[test]
    fn test_unavailable_readings_use_placeholder() {
        let mut snapshot = snapshot();
        snapshot.cpu = CpuReadings::default();
        snapshot.ram = RamReadings::default();

        let cpu = format(&snapshot, Page::Cpu, &PageLayout::default());
        assert_eq!(cpu.lines, vec!["CPU --MHz", "Load --% --"]);

        let ram = format(&snapshot, Page::Ram, &PageLayout::default());
        assert_eq!(ram.lines, vec!["RAM --/--GB", "[----------------]"]);
    }

    #[test]
    fn test_no_gpu() {
        let mut snapshot = snapshot();
        snapshot.gpu = GpuReadings::default();
        let frame = format(&snapshot, Page::Gpu, &PageLayout::default());
        assert_eq!(frame.lines, vec!["No GPU"]);
    }

    #[test]
    fn test_zero_total_gives_empty_bar() {
        for used in [None, Some(0.0), Some(512.0), Some(f64::MAX)] {
            assert_eq!(filled_cells(used, Some(0.0), 10), 0);
        }
        let layout = PageLayout { bar_width: 10, ..PageLayout::default() };
        assert_eq!(bar(Some(5.0), Some(0.0), &layout), "[----------]");
    }

    #[test]
    fn test_bar_rounding_and_clamping() {
        assert_eq!(filled_cells(Some(1.0), Some(3.0), 10), 3);
        assert_eq!(filled_cells(Some(2.0), Some(3.0), 10), 7);
        assert_eq!(filled_cells(Some(64.0), Some(32.0), 10), 10);
        assert_eq!(filled_cells(Some(-4.0), Some(32.0), 10), 0);
        assert_eq!(filled_cells(Some(32.0), Some(32.0), 10), 10);
    }

    #[test]
    fn test_page_rotation_period() {
        let mut page = Page::Cpu;
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(page);
            page = page.next();
        }
        assert_eq!(
            seen,
            vec![Page::Cpu, Page::Gpu, Page::Ram, Page::Cpu, Page::Gpu, Page::Ram]
        );
        for index in 0..9 {
            assert_eq!(Page::from_index(index).index(), index % 3);
        }
        assert!(Page::Cpu < Page::Gpu && Page::Gpu < Page::Ram);
    }

    #[test]
    fn test_formatting_is_idempotent() {
        let snapshot = snapshot();
        let layout = PageLayout::default();
        for page in Page::ALL {
            assert_eq!(format(&snapshot, page, &layout), format(&snapshot, page, &layout));
        }
    }

    #[test]
    fn test_placeholder() {
        let frame = placeholder(Page::Gpu);
        assert_eq!(frame.lines, vec!["GPU", "initializing..."]);
        assert_eq!(frame.page, Page::Gpu);
    }
}
