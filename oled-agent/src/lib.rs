//! Apex OLED agent - system metrics on SteelSeries OLED screens
//!
//! This agent projects LibreHardwareMonitor readings onto a SteelSeries
//! keyboard OLED through the GameSense HTTP API:
//! - Dynamic GameSense port discovery (`coreProps.json`)
//! - Self-healing registration across SteelSeries GG restarts
//! - CPU / GPU / RAM page rotation that keeps running through outages
//! - Optional LibreHardwareMonitor auto-start

pub mod config;
pub mod discovery;
pub mod display;
pub mod launcher;
pub mod logging;
pub mod metrics;
pub mod pages;
pub mod scheduler;
pub mod session;
pub mod transport;

pub use config::AgentConfig;
pub use discovery::{DiscoveryError, Endpoint, PortResolver};
pub use display::{Ack, DisplayDriver, PushError};
pub use metrics::{MetricSource, SensorSnapshot};
pub use pages::{Page, PageLayout, RenderedFrame};
pub use scheduler::{FrameSource, RotationScheduler, TickReport};
pub use session::{BindError, Session, SessionBinder};
pub use transport::{HttpTransport, ReqwestTransport, TransportError};
