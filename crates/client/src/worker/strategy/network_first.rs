use super::{OFFLINE_FILE_UNAVAILABLE, Strategy, WorkerResponse, lookup, store_copy};
use crate::fetch::{FetchRequest, Network};
use shellcache_core::CacheStore;
use std::sync::Arc;

/// Freshness-priority strategy: prefer the live copy, fall back to the
/// stored one, and degrade to an offline notice.
pub struct NetworkFirst {
    network: Arc<dyn Network>,
}

impl NetworkFirst {
    pub fn new(network: Arc<dyn Network>) -> Self {
        Self { network }
    }
}

#[async_trait::async_trait]
impl Strategy for NetworkFirst {
    async fn resolve(&self, store: &CacheStore, request: &FetchRequest) -> WorkerResponse {
        let key = request.key();

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    store_copy(store, &key, &response).await;
                }
                WorkerResponse::network(response)
            }
            Err(e) => {
                tracing::debug!("network failed for {}, trying cache: {e}", request.url);
                match lookup(store, &key).await {
                    Some(hit) => WorkerResponse::cache(hit),
                    None => WorkerResponse::offline(OFFLINE_FILE_UNAVAILABLE),
                }
            }
        }
    }

    fn offline_message(&self) -> &'static str {
        OFFLINE_FILE_UNAVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedNetwork;
    use crate::worker::strategy::ResponseSource;
    use shellcache_core::{CacheDb, RequestKey, ResponseSnapshot};
    use url::Url;

    fn url(path: &str) -> Url {
        Url::parse("https://learn.example").unwrap().join(path).unwrap()
    }

    async fn setup() -> (Arc<ScriptedNetwork>, CacheStore, NetworkFirst) {
        let network = Arc::new(ScriptedNetwork::new());
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v6").await.unwrap();
        let strategy = NetworkFirst::new(network.clone());
        (network, store, strategy)
    }

    #[tokio::test]
    async fn test_fresh_response_overwrites_cache() {
        let (network, store, strategy) = setup().await;
        let key = RequestKey::get(url("/audio/x.mp3"));
        store.put(&key, &ResponseSnapshot::new(200, vec![], "old-audio")).await.unwrap();

        let fresh = ResponseSnapshot::new(200, vec![("content-type".into(), "audio/mpeg".into())], "new-audio");
        network.respond_with(url("/audio/x.mp3"), fresh.clone());

        let response = strategy.resolve(&store, &FetchRequest::get(url("/audio/x.mp3"))).await;
        assert_eq!(response.source, ResponseSource::Network);
        assert_eq!(response.snapshot, fresh);
        assert_eq!(store.get(&key).await.unwrap().unwrap(), fresh);
    }

    #[tokio::test]
    async fn test_offline_falls_back_to_cache() {
        let (network, store, strategy) = setup().await;
        let key = RequestKey::get(url("/docs/sheet.pdf"));
        store.put(&key, &ResponseSnapshot::new(200, vec![], "%PDF-1.7")).await.unwrap();
        network.set_offline(true);

        let response = strategy.resolve(&store, &FetchRequest::get(url("/docs/sheet.pdf"))).await;
        assert_eq!(response.source, ResponseSource::Cache);
        assert_eq!(response.snapshot.text(), Some("%PDF-1.7"));
        assert_eq!(network.call_count(), 1);
    }

    #[tokio::test]
    async fn test_offline_and_uncached_gets_503() {
        let (network, store, strategy) = setup().await;
        network.fail(url("/audio/x.mp3"));

        let response = strategy.resolve(&store, &FetchRequest::get(url("/audio/x.mp3"))).await;
        assert_eq!(response.source, ResponseSource::Offline);
        assert_eq!(response.snapshot.status, 503);
        assert_eq!(response.snapshot.text(), Some("Offline. File unavailable."));
        assert_eq!(response.snapshot.content_type(), Some("text/plain; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_error_status_keeps_previous_copy() {
        let (network, store, strategy) = setup().await;
        let key = RequestKey::get(url("/img/a.png"));
        store.put(&key, &ResponseSnapshot::new(200, vec![], "png-v1")).await.unwrap();
        network.respond(url("/img/a.png"), 500, "oops");

        let response = strategy.resolve(&store, &FetchRequest::get(url("/img/a.png"))).await;
        assert_eq!(response.snapshot.status, 500);
        assert_eq!(store.get(&key).await.unwrap().unwrap().text(), Some("png-v1"));
    }
}
