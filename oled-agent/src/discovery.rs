//! GameSense endpoint discovery
//!
//! SteelSeries GG publishes the port of its local HTTP API in `coreProps.json`
//! and picks a new port on every start. This module handles:
//! - Reading the discovery file from an ordered list of candidate paths
//! - Parsing the `address` (`host:port`) into an [`Endpoint`]
//! - Caching the last-known endpoint until it is explicitly invalidated

use serde::Deserialize;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Base address of the peripheral service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    /// Prefix prepended to every route (empty for GameSense)
    pub base_path: String,
}

impl Endpoint {
    /// Parse a `host:port` address as found in `coreProps.json`
    pub fn parse(address: &str) -> Option<Self> {
        let (host, port) = address.trim().rsplit_once(':')?;
        let host = host.trim_start_matches("http://");
        if host.is_empty() {
            return None;
        }
        let port: u16 = port.parse().ok()?;
        if port == 0 {
            return None;
        }
        Some(Endpoint {
            host: host.to_string(),
            port,
            base_path: String::new(),
        })
    }

    /// Absolute URL of `route` on this endpoint
    pub fn url(&self, route: &str) -> String {
        format!("http://{}:{}{}{}", self.host, self.port, self.base_path, route)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.host, self.port, self.base_path)
    }
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("GameSense discovery file not found (searched {searched:?})")]
    NotFound { searched: Vec<PathBuf> },
    #[error("discovery file {path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

#[derive(Debug, Deserialize)]
struct CoreProps {
    address: Option<String>,
}

/// Locates the current GameSense endpoint
#[derive(Debug)]
pub struct PortResolver {
    paths: Vec<PathBuf>,
    last_known: Option<Endpoint>,
    fresh: bool,
}

impl PortResolver {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            last_known: None,
            fresh: false,
        }
    }

    /// Current endpoint, re-read from disk unless the cache is still fresh
    pub async fn resolve(&mut self) -> Result<Endpoint, DiscoveryError> {
        if self.fresh {
            if let Some(endpoint) = &self.last_known {
                return Ok(endpoint.clone());
            }
        }

        let endpoint = self.read_discovery_file().await?;
        if self.last_known.as_ref() != Some(&endpoint) {
            info!("GameSense endpoint changed -> {}", endpoint);
        }
        self.last_known = Some(endpoint.clone());
        self.fresh = true;
        Ok(endpoint)
    }

    /// Drop the cached endpoint so the next `resolve()` reads the file again
    pub fn invalidate(&mut self) {
        if self.fresh {
            debug!("Invalidating cached GameSense endpoint");
        }
        self.fresh = false;
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn last_known(&self) -> Option<&Endpoint> {
        self.last_known.as_ref()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    async fn read_discovery_file(&self) -> Result<Endpoint, DiscoveryError> {
        let mut first_malformed = None;

        for path in &self.paths {
            match Self::read_candidate(path).await {
                Ok(Some(endpoint)) => return Ok(endpoint),
                Ok(None) => continue,
                Err(e) => {
                    debug!("Skipping discovery candidate: {}", e);
                    first_malformed.get_or_insert(e);
                }
            }
        }

        Err(first_malformed.unwrap_or_else(|| DiscoveryError::NotFound {
            searched: self.paths.clone(),
        }))
    }

    /// `Ok(None)` when the candidate does not exist
    async fn read_candidate(path: &Path) -> Result<Option<Endpoint>, DiscoveryError> {
        let malformed = |reason: String| DiscoveryError::Malformed {
            path: path.to_path_buf(),
            reason,
        };

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(malformed(format!("unreadable: {}", e))),
        };

        let props: CoreProps =
            serde_json::from_str(&content).map_err(|e| malformed(format!("invalid JSON: {}", e)))?;
        let address = props
            .address
            .ok_or_else(|| malformed("missing \"address\"".to_string()))?;

        Endpoint::parse(&address)
            .map(Some)
            .ok_or_else(|| malformed(format!("invalid address {:?}", address)))
    }
}
