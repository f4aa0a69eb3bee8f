use super::{OFFLINE_NO_CONNECTION, Strategy, WorkerResponse, lookup, store_copy};
use crate::fetch::{FetchRequest, Network};
use shellcache_core::{CacheStore, RequestKey};
use std::sync::Arc;
use url::Url;

/// Asset-priority strategy: serve the stored copy when there is one,
/// otherwise fetch and write through.
pub struct CacheFirst {
    network: Arc<dyn Network>,
    offline_document: Option<RequestKey>,
}

impl CacheFirst {
    /// `offline_document` is the cached root document served to navigations
    /// while offline.
    pub fn new(network: Arc<dyn Network>, offline_document: Option<Url>) -> Self {
        Self { network, offline_document: offline_document.map(RequestKey::get) }
    }

    async fn offline_shell(&self, store: &CacheStore) -> Option<WorkerResponse> {
        let document = self.offline_document.as_ref()?;
        lookup(store, document).await.map(WorkerResponse::cache)
    }
}

#[async_trait::async_trait]
impl Strategy for CacheFirst {
    async fn resolve(&self, store: &CacheStore, request: &FetchRequest) -> WorkerResponse {
        let key = request.key();

        if let Some(hit) = lookup(store, &key).await {
            tracing::debug!(store = store.name(), "cache hit for {}", request.url);
            return WorkerResponse::cache(hit);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    store_copy(store, &key, &response).await;
                }
                WorkerResponse::network(response)
            }
            Err(e) => {
                tracing::debug!("network failed for {}: {e}", request.url);
                if request.navigate
                    && let Some(shell) = self.offline_shell(store).await
                {
                    return shell;
                }
                WorkerResponse::offline(OFFLINE_NO_CONNECTION)
            }
        }
    }

    fn offline_message(&self) -> &'static str {
        OFFLINE_NO_CONNECTION
    }
}
