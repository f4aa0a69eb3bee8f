//! Retrieval strategies.
//!
//! A strategy always produces a response: cached, fresh, or a synthetic
//! offline notice. Store errors are logged and treated as a miss (on reads)
//! or a skipped write, so nothing below this layer reaches the application.

mod cache_first;
mod network_first;

pub use cache_first::CacheFirst;
pub use network_first::NetworkFirst;

use crate::fetch::FetchRequest;
use serde::Serialize;
use shellcache_core::{CacheStore, RequestKey, ResponseSnapshot};

/// Body of the cache-first offline response.
pub const OFFLINE_NO_CONNECTION: &str = "Offline. No connection.";

/// Body of the network-first offline response.
pub const OFFLINE_FILE_UNAVAILABLE: &str = "Offline. File unavailable.";

/// Where a worker response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
    Offline,
}

/// A response handed back across the interception boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerResponse {
    pub snapshot: ResponseSnapshot,
    pub source: ResponseSource,
}

impl WorkerResponse {
    pub fn cache(snapshot: ResponseSnapshot) -> Self {
        Self { snapshot, source: ResponseSource::Cache }
    }

    pub fn network(snapshot: ResponseSnapshot) -> Self {
        Self { snapshot, source: ResponseSource::Network }
    }

    pub fn offline(message: &'static str) -> Self {
        Self { snapshot: ResponseSnapshot::offline(message), source: ResponseSource::Offline }
    }
}

/// A caching discipline applied to one classified request.
#[async_trait::async_trait]
pub trait Strategy: Send + Sync {
    /// Produce a response for `request` using `store` as the current generation.
    async fn resolve(&self, store: &CacheStore, request: &FetchRequest) -> WorkerResponse;

    /// Body used when neither network nor cache can answer.
    fn offline_message(&self) -> &'static str;
}

async fn lookup(store: &CacheStore, key: &RequestKey) -> Option<ResponseSnapshot> {
    match store.get(key).await {
        Ok(hit) => hit,
        Err(e) => {
            tracing::warn!(store = store.name(), %key, "cache read failed, treating as miss: {e}");
            None
        }
    }
}

async fn store_copy(store: &CacheStore, key: &RequestKey, snapshot: &ResponseSnapshot) {
    if let Err(e) = store.put(key, snapshot).await {
        tracing::warn!(store = store.name(), %key, "cache write skipped: {e}");
    }
}
