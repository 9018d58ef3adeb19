//! Pushes rendered frames to the OLED through the bound GameSense session

use crate::config::GameSenseConfig;
use crate::pages::{RenderedFrame, MAX_LINES};
use crate::session::{frame_key, BindError, SessionBinder};
use crate::transport::{HttpTransport, TransportError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const GAME_EVENT_ROUTE: &str = "/game_event";

/// Accepted push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// Event value sent with the frame
    pub sequence: u64,
}

#[derive(Debug, Error)]
pub enum PushError {
    #[error("display not bound: {0}")]
    NotBound(#[from] BindError),
    #[error("display push failed: {0}")]
    PushFailed(#[source] TransportError),
}

/// `game_event` payload
#[derive(Debug, Serialize)]
struct GameEvent<'a> {
    game: &'a str,
    event: &'a str,
    data: EventData,
}

#[derive(Debug, Serialize)]
struct EventData {
    /// GameSense ignores repeated values, so this always changes
    value: u64,
    frame: BTreeMap<String, String>,
}

pub struct DisplayDriver<T> {
    binder: SessionBinder<T>,
    transport: T,
    timeout: Duration,
    max_line_chars: usize,
    sequence: u64,
}

impl<T: HttpTransport> DisplayDriver<T> {
    pub fn new(binder: SessionBinder<T>, transport: T, config: &GameSenseConfig) -> Self {
        Self {
            binder,
            transport,
            timeout: config.timeout(),
            max_line_chars: config.max_line_chars,
            sequence: 0,
        }
    }

    /// Send `frame` to the screen, binding first if needed
    pub async fn push(&mut self, frame: &RenderedFrame) -> Result<Ack, PushError> {
        let lines = self.frame_lines(frame);
        let (url, game, event_name) = {
            let session = self.binder.ensure_bound().await?;
            let url = match &session.endpoint {
                Some(endpoint) => endpoint.url(GAME_EVENT_ROUTE),
                None => return Err(PushError::NotBound(BindError::MissingEndpoint)),
            };
            (url, session.game.clone(), session.event.clone())
        };

        let event = GameEvent {
            game: &game,
            event: &event_name,
            data: EventData {
                value: self.sequence,
                frame: lines,
            },
        };

        match self.transport.post_json(&url, &event, self.timeout).await {
            Ok(()) => {
                let ack = Ack { sequence: self.sequence };
                self.sequence += 1;
                debug!("Pushed {:?} page (value {})", frame.page, ack.sequence);
                Ok(ack)
            }
            Err(e) => {
                self.binder.invalidate_session();
                Err(PushError::PushFailed(e))
            }
        }
    }

    pub fn binder(&self) -> &SessionBinder<T> {
        &self.binder
    }

    /// `l1`..`l3`, blank when the page has fewer lines, cut to the OLED width
    fn frame_lines(&self, frame: &RenderedFrame) -> BTreeMap<String, String> {
        (0..MAX_LINES)
            .map(|index| {
                let line = frame
                    .lines
                    .get(index)
                    .map(|line| line.chars().take(self.max_line_chars).collect::<String>())
                    .unwrap_or_default();
                (frame_key(index), line)
            })
            .collect()
    }
}
