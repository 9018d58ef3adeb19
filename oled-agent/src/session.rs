//! GameSense registration
//!
//! Binding declares the game and its single screen event against the
//! resolved endpoint. A bound session is reused without any network call
//! until it is invalidated, either by a failed registration or by the
//! display driver after a failed push.

use crate::config::GameSenseConfig;
use crate::discovery::{DiscoveryError, Endpoint, PortResolver};
use crate::pages::MAX_LINES;
use crate::transport::{HttpTransport, TransportError};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const GAME_METADATA_ROUTE: &str = "/game_metadata";
pub const BIND_EVENT_ROUTE: &str = "/bind_game_event";

/// Context-frame key of screen line `index` (zero-based)
pub fn frame_key(index: usize) -> String {
    format!("l{}", index + 1)
}

/// Registration state, re-created in place on every bind
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub endpoint: Option<Endpoint>,
    pub game: String,
    pub event: String,
    pub bound: bool,
}

#[derive(Debug, Error)]
pub enum BindError {
    #[error("GameSense unavailable: {0}")]
    Discovery(#[from] DiscoveryError),
    #[error("registration with {endpoint} failed: {source}")]
    RegistrationFailed {
        endpoint: Endpoint,
        #[source]
        source: TransportError,
    },
    #[error("session bound without an endpoint")]
    MissingEndpoint,
}

/// `game_metadata` payload
#[derive(Debug, Serialize)]
struct GameMetadata<'a> {
    game: &'a str,
    game_display_name: &'a str,
    developer: &'a str,
    deinitialize_timer_length_ms: u64,
}

/// `bind_game_event` payload
#[derive(Debug, Serialize)]
struct BindGameEvent<'a> {
    game: &'a str,
    event: &'a str,
    icon_id: u32,
    handlers: Vec<ScreenHandler<'a>>,
}

#[derive(Debug, Serialize)]
struct ScreenHandler<'a> {
    #[serde(rename = "device-type")]
    device_type: &'a str,
    zone: &'a str,
    mode: &'a str,
    datas: Vec<ScreenData>,
}

#[derive(Debug, Serialize)]
struct ScreenData {
    lines: Vec<ScreenLine>,
}

#[derive(Debug, Serialize)]
struct ScreenLine {
    #[serde(rename = "has-text")]
    has_text: bool,
    #[serde(rename = "context-frame-key")]
    context_frame_key: String,
}

/// Owns the session and the resolver behind it
pub struct SessionBinder<T> {
    resolver: PortResolver,
    transport: T,
    session: Session,
    display_name: String,
    developer: String,
    icon_id: u32,
    device_type: String,
    deinitialize_timer_ms: u64,
    timeout: Duration,
    registrations: u64,
}

impl<T: HttpTransport> SessionBinder<T> {
    pub fn new(resolver: PortResolver, transport: T, config: &GameSenseConfig) -> Self {
        Self {
            resolver,
            transport,
            session: Session {
                endpoint: None,
                game: config.game.clone(),
                event: config.event.clone(),
                bound: false,
            },
            display_name: config.game_display_name.clone(),
            developer: config.developer.clone(),
            icon_id: config.icon_id,
            device_type: config.device_type.clone(),
            deinitialize_timer_ms: config.deinitialize_timer_ms,
            timeout: config.timeout(),
            registrations: 0,
        }
    }

    /// Bound session, registering first if needed
    pub async fn ensure_bound(&mut self) -> Result<&Session, BindError> {
        if self.session.bound {
            return Ok(&self.session);
        }

        let endpoint = self.resolver.resolve().await?;
        if let Err(source) = self.register(&endpoint).await {
            self.resolver.invalidate();
            return Err(BindError::RegistrationFailed { endpoint, source });
        }

        info!(
            "GameSense bound at {} (game: {}, event: {})",
            endpoint, self.session.game, self.session.event
        );
        self.session.endpoint = Some(endpoint);
        self.session.bound = true;
        self.registrations += 1;
        Ok(&self.session)
    }

    /// Force the next `ensure_bound()` to rediscover and register again
    pub fn invalidate_session(&mut self) {
        if self.session.bound {
            debug!("Invalidating GameSense session");
        }
        self.session.bound = false;
        self.resolver.invalidate();
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_bound(&self) -> bool {
        self.session.bound
    }

    /// Successful registrations since startup
    pub fn registrations(&self) -> u64 {
        self.registrations
    }

    pub fn resolver(&self) -> &PortResolver {
        &self.resolver
    }

    async fn register(&self, endpoint: &Endpoint) -> Result<(), TransportError> {
        let metadata = GameMetadata {
            game: &self.session.game,
            game_display_name: &self.display_name,
            developer: &self.developer,
            deinitialize_timer_length_ms: self.deinitialize_timer_ms,
        };
        self.transport
            .post_json(&endpoint.url(GAME_METADATA_ROUTE), &metadata, self.timeout)
            .await?;

        let binding = BindGameEvent {
            game: &self.session.game,
            event: &self.session.event,
            icon_id: self.icon_id,
            handlers: vec![ScreenHandler {
                device_type: &self.device_type,
                zone: "one",
                mode: "screen",
                datas: vec![ScreenData {
                    lines: (0..MAX_LINES)
                        .map(|index| ScreenLine {
                            has_text: true,
                            context_frame_key: frame_key(index),
                        })
                        .collect(),
                }],
            }],
        };
        self.transport
            .post_json(&endpoint.url(BIND_EVENT_ROUTE), &binding, self.timeout)
            .await
    }
}
