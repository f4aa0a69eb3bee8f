//! cache_keys tool implementation.
//!
//! Lists the request identities held by the active generation.

use rmcp::ErrorData as McpError;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::ServiceWorker;

use super::active_store;
use crate::tools::json_result;

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub generation: String,
    /// `"GET <url>"` for each entry, ordered by URL.
    pub keys: Vec<String>,
    pub count: usize,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let store = active_store(worker).await?;
    let keys: Vec<String> = store.keys().await?.iter().map(ToString::to_string).collect();

    let output = CacheKeysOutput { generation: store.name().to_string(), count: keys.len(), keys };
    json_result(&output)
}
