//! Scripted API client for tests.
//!
//! Routes are keyed by method and path. A route can answer immediately,
//! after a delay, or once its gate is opened, which lets tests order
//! responses deterministically.

use async_trait::async_trait;
use quill_core::{ApiClient, Method, QuillError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Clone)]
struct Route {
    response: Result<Value>,
    gate: Option<Arc<Notify>>,
    delay: Option<Duration>,
}

/// A recorded request.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct ScriptedApi {
    routes: Mutex<HashMap<(Method, String), Route>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn insert(&self, method: Method, path: &str, route: Route) {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), route);
    }

    /// Answers `method path` immediately.
    pub fn respond(&self, method: Method, path: &str, response: Result<Value>) {
        self.insert(
            method,
            path,
            Route {
                response,
                gate: None,
                delay: None,
            },
        );
    }

    /// Answers `method path` after `delay`.
    pub fn respond_after(&self, method: Method, path: &str, delay: Duration, response: Result<Value>) {
        self.insert(
            method,
            path,
            Route {
                response,
                gate: None,
                delay: Some(delay),
            },
        );
    }

    /// Answers `method path` once the returned gate is notified.
    pub fn respond_gated(&self, method: Method, path: &str, response: Result<Value>) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.insert(
            method,
            path,
            Route {
                response,
                gate: Some(gate.clone()),
                delay: None,
            },
        );
        gate
    }

    /// Number of requests seen for `method path`.
    pub fn calls(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn history(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiClient for ScriptedApi {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            body,
        });

        let route = self
            .routes
            .lock()
            .unwrap()
            .get(&(method, path.to_string()))
            .cloned();
        let Some(route) = route else {
            return Err(QuillError::transport(
                Some(404),
                format!("no scripted response for {method} {path}"),
            ));
        };

        if let Some(gate) = route.gate {
            gate.notified().await;
        }
        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }
        route.response
    }
}
