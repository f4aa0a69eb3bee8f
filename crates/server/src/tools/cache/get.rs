//! cache_get tool implementation.
//!
//! Retrieves the cached response for a GET request from the active generation.

use rmcp::ErrorData as McpError;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::ServiceWorker;
use shellcache_core::{Error, RequestKey};

use super::active_store;
use crate::tools::{body_text, json_result, resolve_url};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL, or a root-relative path resolved against the origin.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    /// Generation whose store answered.
    pub generation: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Body text, when the body is valid UTF-8.
    pub body: Option<String>,
    pub body_len: usize,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(worker: &ServiceWorker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = resolve_url(worker.router().origin(), &params.url)?;
    let store = active_store(worker).await?;

    let key = RequestKey::get(url);
    let snapshot = store
        .get(&key)
        .await?
        .ok_or_else(|| Error::CacheMiss(key.to_string()))?;

    let output = CacheGetOutput {
        generation: store.name().to_string(),
        url: key.url().to_string(),
        status: snapshot.status,
        body: body_text(&snapshot),
        body_len: snapshot.body.len(),
        headers: snapshot.headers,
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tests::{output_text, test_worker};

    #[tokio::test]
    async fn test_get_impl_not_active() {
        let (worker, _network) = test_worker().await;
        let params = CacheGetParams { url: "/index.html".into() };

        let err = get_impl(&worker, params).await.unwrap_err();
        assert_eq!(err.code.0, -32007);
    }

    #[tokio::test]
    async fn test_get_impl_missing() {
        let (worker, _network) = test_worker().await;
        worker.deploy("v6").await.unwrap();

        let params = CacheGetParams { url: "/never-fetched.json".into() };
        assert!(get_impl(&worker, params).await.is_err());
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let (worker, _network) = test_worker().await;
        worker.deploy("v6").await.unwrap();

        let params = CacheGetParams { url: "https://LEARN.example/index.html#top".into() };
        let result = get_impl(&worker, params).await.unwrap();
        let output: CacheGetOutput = serde_json::from_str(&output_text(&result)).unwrap();
        assert_eq!(output.generation, "v6");
        assert_eq!(output.url, "https://learn.example/index.html");
        assert_eq!(output.status, 200);
        assert_eq!(output.body.as_deref(), Some("<html>shell</html>"));
    }
}
