/*!
Transport HTTP simulé pour développement sans GameSense ni LibreHardwareMonitor

Permet de tester l'agent sans SteelSeries GG ni serveur de capteurs réels.
Enregistre toutes les requêtes émises et permet de simuler des pannes
(timeouts, HTTP 500, connexion refusée, JSON invalide).
*/

use oled_agent::transport::{HttpTransport, TransportError};
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

/// Panne simulée pour une route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubFailure {
    Status(u16),
    Timeout,
    Refused,
    Garbage,
}

impl StubFailure {
    fn into_error(self, url: &str) -> TransportError {
        let url = url.to_string();
        match self {
            StubFailure::Status(status) => TransportError::Status { url, status },
            StubFailure::Timeout => TransportError::Timeout { url },
            StubFailure::Refused => TransportError::Connect {
                url,
                reason: "connection refused".to_string(),
            },
            StubFailure::Garbage => TransportError::Decode {
                url,
                reason: "expected value at line 1 column 1".to_string(),
            },
        }
    }
}

#[derive(Debug)]
struct RouteFailure {
    route: String,
    failure: StubFailure,
    /// `None` = panne permanente jusqu'à `restore_route`
    remaining: Option<usize>,
}

/// Double de `HttpTransport` : GET renvoie l'arbre de capteurs configuré,
/// POST répond 200 sauf panne programmée
#[derive(Clone, Default)]
pub struct MockTransport {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    sensor_tree: Arc<Mutex<Option<Value>>>,
    failures: Arc<Mutex<VecDeque<RouteFailure>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arbre renvoyé par les GET (data.json)
    pub fn serve_sensors(&self, tree: Value) {
        *self.sensor_tree.lock().unwrap() = Some(tree);
    }

    /// Plus de serveur de capteurs : les GET échouent (connexion refusée)
    pub fn stop_sensors(&self) {
        *self.sensor_tree.lock().unwrap() = None;
    }

    /// Les `times` prochaines requêtes dont l'URL finit par `route` échouent
    pub fn fail_next(&self, route: &str, failure: StubFailure, times: usize) {
        if times == 0 {
            return;
        }
        self.failures.lock().unwrap().push_back(RouteFailure {
            route: route.to_string(),
            failure,
            remaining: Some(times),
        });
    }

    /// Toutes les requêtes vers `route` échouent jusqu'à `restore_route`
    pub fn fail_route(&self, route: &str, failure: StubFailure) {
        self.failures.lock().unwrap().push_back(RouteFailure {
            route: route.to_string(),
            failure,
            remaining: None,
        });
    }

    pub fn restore_route(&self, route: &str) {
        self.failures.lock().unwrap().retain(|f| f.route != route);
    }

    /// Récupère toutes les requêtes émises (pour assertions de tests)
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requêtes dont l'URL finit par `route`
    pub fn requests_to(&self, route: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.ends_with(route))
            .cloned()
            .collect()
    }

    pub fn count(&self, route: &str) -> usize {
        self.requests_to(route).len()
    }

    /// Corps JSON de la dernière requête vers `route`
    pub fn last_body(&self, route: &str) -> Option<Value> {
        self.requests_to(route).last().and_then(|r| r.body.clone())
    }

    /// Reset des requêtes enregistrées et des pannes programmées
    pub fn clear(&self) {
        self.requests.lock().unwrap().clear();
        self.failures.lock().unwrap().clear();
    }

    fn record(&self, method: Method, url: &str, body: Option<Value>) {
        log::info!("📤 [MOCK] {:?} {}", method, url);
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url: url.to_string(),
            body,
        });
    }

    fn take_failure(&self, url: &str) -> Option<StubFailure> {
        let mut failures = self.failures.lock().unwrap();
        let index = failures.iter().position(|f| url.ends_with(&f.route))?;
        let failure = failures[index].failure.clone();

        let exhausted = match failures[index].remaining.as_mut() {
            Some(remaining) => {
                *remaining = remaining.saturating_sub(1);
                *remaining == 0
            }
            None => false,
        };
        if exhausted {
            failures.remove(index);
        }
        log::info!("💥 [MOCK] Simulated {:?} for {}", failure, url);
        Some(failure)
    }
}

impl HttpTransport for MockTransport {
    async fn get_json(&self, url: &str, _timeout: Duration) -> Result<Value, TransportError> {
        self.record(Method::Get, url, None);
        if let Some(failure) = self.take_failure(url) {
            return Err(failure.into_error(url));
        }
        let tree = self.sensor_tree.lock().unwrap().clone();
        tree.ok_or_else(|| StubFailure::Refused.into_error(url))
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
        _timeout: Duration,
    ) -> Result<(), TransportError> {
        self.record(Method::Post, url, serde_json::to_value(body).ok());
        match self.take_failure(url) {
            Some(failure) => Err(failure.into_error(url)),
            None => Ok(()),
        }
    }
}
