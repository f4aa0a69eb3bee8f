//! Cache-related MCP tools.
//!
//! These read the store of the generation currently serving requests.

pub mod get;
pub mod keys;

pub use get::{CacheGetParams, get_impl};
pub use keys::keys_impl;

use shellcache_client::ServiceWorker;
use shellcache_core::{CacheStore, Error};

async fn active_store(worker: &ServiceWorker) -> Result<CacheStore, Error> {
    worker.current_store().await.ok_or(Error::NotActive)
}
