//! HTTP transport shared by the sensor source and the GameSense client
//!
//! Every network call in the agent goes through [`HttpTransport`] so the
//! instance graph can be built once at startup and driven by an in-memory
//! double in tests. Calls are bounded by a per-request timeout; a timeout is
//! reported like any other connection failure.

use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Transport-level failure of a single request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("undecodable response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// Minimal JSON-over-HTTP client used by all components
pub trait HttpTransport: Clone + Send + Sync {
    /// GET `url` and decode the body as JSON. Non-2xx is an error.
    fn get_json(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;

    /// POST `body` as JSON to `url`. Non-2xx is an error.
    fn post_json<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Production transport backed by `reqwest`
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn classify(url: &str, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout { url: url.to_string() }
        } else if let Some(status) = err.status() {
            TransportError::Status { url: url.to_string(), status: status.as_u16() }
        } else if err.is_decode() || err.is_body() {
            TransportError::Decode { url: url.to_string(), reason: err.to_string() }
        } else {
            TransportError::Connect { url: url.to_string(), reason: err.to_string() }
        }
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, TransportError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status { url: url.to_string(), status: status.as_u16() });
        }

        let body = response.bytes().await.map_err(|e| Self::classify(url, e))?;
        serde_json::from_slice(&body).map_err(|e| TransportError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<(), TransportError> {
        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| Self::classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status { url: url.to_string(), status: status.as_u16() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_url() {
        let err = TransportError::Status { url: "http://127.0.0.1:1/game_event".into(), status: 500 };
        assert_eq!(err.to_string(), "http://127.0.0.1:1/game_event answered HTTP 500");

        let err = TransportError::Timeout { url: "http://localhost:8085/data.json".into() };
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_connect_failure() {
        let transport = ReqwestTransport::new();
        // Port 9 (discard) on loopback is closed on any sane test machine
        let result = transport
            .get_json("http://127.0.0.1:9/data.json", Duration::from_millis(500))
            .await;
        assert!(matches!(
            result,
            Err(TransportError::Connect { .. }) | Err(TransportError::Timeout { .. })
        ));
    }
}
