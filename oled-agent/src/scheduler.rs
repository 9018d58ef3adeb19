//! Page rotation loop
//!
//! One tick = advance the page, poll sensors, format, push. A tick never
//! fails: sensor outages fall back to the last valid snapshot, display
//! failures are logged and retried on the next tick through a fresh bind.

use crate::config::AgentConfig;
use crate::discovery::PortResolver;
use crate::display::{Ack, DisplayDriver, PushError};
use crate::metrics::{MetricSource, SensorSnapshot};
use crate::pages::{self, Page, PageLayout, RenderedFrame};
use crate::session::SessionBinder;
use crate::transport::HttpTransport;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// What the rendered frame was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSource {
    /// Snapshot fetched this tick
    Fresh,
    /// Fetch failed, last valid snapshot reused
    Stale,
    /// Nothing valid yet
    Placeholder,
}

/// Outcome of a single tick
#[derive(Debug)]
pub struct TickReport {
    pub tick: u64,
    pub page: Page,
    pub source: FrameSource,
    pub frame: RenderedFrame,
    pub push: Result<Ack, PushError>,
}

pub struct RotationScheduler<T> {
    metrics: MetricSource<T>,
    display: DisplayDriver<T>,
    layout: PageLayout,
    tick_interval: Duration,
    page_index: usize,
    last_valid: Option<SensorSnapshot>,
    ticks: u64,
    failed_pushes: u64,
}

impl<T: HttpTransport> RotationScheduler<T> {
    pub fn new(
        metrics: MetricSource<T>,
        display: DisplayDriver<T>,
        layout: PageLayout,
        tick_interval: Duration,
    ) -> Self {
        Self {
            metrics,
            display,
            layout,
            tick_interval,
            // One step before CPU so the first tick lands on it
            page_index: Page::COUNT - 1,
            last_valid: None,
            ticks: 0,
            failed_pushes: 0,
        }
    }

    /// Build the whole instance graph from config
    pub fn from_config(config: &AgentConfig, transport: T) -> Self {
        let resolver = PortResolver::new(config.gamesense.discovery_paths.clone());
        let binder = SessionBinder::new(resolver, transport.clone(), &config.gamesense);
        let display = DisplayDriver::new(binder, transport.clone(), &config.gamesense);
        let metrics = MetricSource::new(transport, &config.sensors);
        Self::new(
            metrics,
            display,
            config.rotation.layout(),
            config.rotation.tick_interval(),
        )
    }

    /// Run one rotation step
    pub async fn tick(&mut self) -> TickReport {
        self.page_index = (self.page_index + 1) % Page::COUNT;
        let page = Page::from_index(self.page_index);

        let snapshot = self.metrics.fetch().await;
        let source = if snapshot.valid {
            self.last_valid = Some(snapshot);
            FrameSource::Fresh
        } else if self.last_valid.is_some() {
            FrameSource::Stale
        } else {
            FrameSource::Placeholder
        };

        let frame = match &self.last_valid {
            Some(valid) => pages::format(valid, page, &self.layout),
            None => pages::placeholder(page),
        };

        let push = self.display.push(&frame).await;
        self.record_push(&push);
        self.ticks += 1;

        TickReport {
            tick: self.ticks,
            page,
            source,
            frame,
            push,
        }
    }

    /// Tick on a fixed interval until `shutdown` resolves
    pub async fn run<F: Future<Output = ()>>(&mut self, shutdown: F) {
        info!(
            "🔄 Starting page rotation (every {} ms)",
            self.tick_interval.as_millis()
        );
        let mut timer = interval(self.tick_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.tick().await;
                }
                _ = &mut shutdown => {
                    info!("🛑 Page rotation stopped after {} ticks", self.ticks);
                    break;
                }
            }
        }
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_valid(&self) -> Option<&SensorSnapshot> {
        self.last_valid.as_ref()
    }

    pub fn display(&self) -> &DisplayDriver<T> {
        &self.display
    }

    fn record_push(&mut self, push: &Result<Ack, PushError>) {
        match push {
            Ok(_) => {
                if self.failed_pushes > 0 {
                    info!("Display recovered after {} failed pushes", self.failed_pushes);
                }
                self.failed_pushes = 0;
            }
            Err(e) => {
                if self.failed_pushes == 0 {
                    warn!("Display update failed: {}", e);
                } else {
                    debug!("Display update still failing ({}): {}", self.failed_pushes, e);
                }
                self.failed_pushes += 1;
            }
        }
    }
}
