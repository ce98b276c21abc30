//! Scripted transport used by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use leadhub_core::api::{ApiRequest, ApiResponse, ApiTransport, Method};
use leadhub_core::{HubError, Result};
use serde_json::Value;
use tokio::sync::Notify;

type Route = (Method, String);

/// Answers requests from per-route queues and records every request.
///
/// A route with an empty queue answers with a transport error.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<Route, VecDeque<Result<ApiResponse>>>>,
    requests: Mutex<Vec<ApiRequest>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: Method, path: &str, body: Value) -> &Self {
        self.push(method, path, Ok(ApiResponse::ok(body)))
    }

    pub fn fail(&self, method: Method, path: &str, err: HubError) -> &Self {
        self.push(method, path, Err(err))
    }

    fn push(&self, method: Method, path: &str, result: Result<ApiResponse>) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(result);
        self
    }

    /// Holds the next request to `path` until the returned handle is notified.
    pub fn hold(&self, path: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(path.to_string(), notify.clone());
        notify
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let gate = self.gates.lock().unwrap().remove(&request.path);
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.routes
            .lock()
            .unwrap()
            .get_mut(&(request.method, request.path.clone()))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(HubError::transport(format!(
                    "no scripted response for {} {}",
                    request.method, request.path
                )))
            })
    }
}
