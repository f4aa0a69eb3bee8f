//! Scripted network for tests.
//!
//! Responses are registered per URL; unknown URLs answer 404. The whole
//! network can be switched offline, and individual URLs can be made to
//! fail at the transport level.

use crate::fetch::{FetchRequest, Network, NetworkError};
use bytes::Bytes;
use shellcache_core::ResponseSnapshot;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

#[derive(Debug, Clone)]
enum Scripted {
    Respond(ResponseSnapshot),
    Fail,
}

/// In-memory `Network` whose answers are set up by the test.
#[derive(Debug, Default)]
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `status` and `body`.
    pub fn respond(&self, url: Url, status: u16, body: impl Into<Bytes>) {
        self.respond_with(url, ResponseSnapshot::new(status, Vec::new(), body));
    }

    pub fn respond_with(&self, url: Url, snapshot: ResponseSnapshot) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Scripted::Respond(snapshot));
    }

    /// Make `url` fail as if the connection dropped.
    pub fn fail(&self, url: Url) {
        self.routes.lock().unwrap().insert(url.to_string(), Scripted::Fail);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Total number of fetches attempted.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of fetches attempted for `url`.
    pub fn calls_for(&self, url: &Url) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|called| called.as_str() == url.as_str())
            .count()
    }
}

#[async_trait::async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, NetworkError> {
        let target = request.url.to_string();
        self.calls.lock().unwrap().push(target.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::Offline(format!("no route to {}", request.url)));
        }

        let scripted = self.routes.lock().unwrap().get(&target).cloned();
        match scripted {
            Some(Scripted::Respond(snapshot)) => Ok(snapshot),
            Some(Scripted::Fail) => Err(NetworkError::Offline(format!("connection reset by {}", request.url))),
            None => Ok(ResponseSnapshot::new(404, Vec::new(), "not found")),
        }
    }
}
