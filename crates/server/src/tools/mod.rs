//! MCP tool implementations.
//!
//! This module contains all tools exposed by the shellcache server. Every
//! tool answers with pretty-printed JSON in a single text content block.

pub mod cache;
pub mod client;
pub mod deploy;
pub mod shell_fetch;
pub mod status;

pub use client::{ShellClientParams, close_impl, open_impl};
pub use deploy::{ShellDeployParams, deploy_impl};
pub use shell_fetch::{ShellFetchParams, fetch_impl};
pub use status::status_impl;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use shellcache_client::fetch::{UrlError, resolve};
use shellcache_core::{Error, ResponseSnapshot};
use url::Url;

fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Resolve a tool's `url` argument against the worker origin.
fn resolve_url(origin: &Url, input: &str) -> Result<Url, Error> {
    resolve(origin, input).map_err(|e| match e {
        UrlError::Empty => Error::InvalidInput("url cannot be empty".into()),
        other => Error::InvalidUrl(other.to_string()),
    })
}

/// Body as text when it is valid UTF-8; binary bodies are reported by length only.
fn body_text(snapshot: &ResponseSnapshot) -> Option<String> {
    snapshot.text().map(str::to_string)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use rmcp::model::CallToolResult;
    use shellcache_client::testing::ScriptedNetwork;
    use shellcache_client::{PrecacheManifest, ServiceWorker, WorkerConfig};
    use shellcache_core::CacheDb;
    use url::Url;

    pub(crate) const ORIGIN: &str = "https://learn.example";

    pub(crate) fn url(path: &str) -> Url {
        Url::parse(ORIGIN).unwrap().join(path).unwrap()
    }

    pub(crate) fn output_text(result: &CallToolResult) -> String {
        result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|content| content.text.clone())
            .expect("Expected text content")
    }

    /// Worker over an in-memory database with `/index.html` and `/app.js` precached.
    pub(crate) async fn test_worker() -> (ServiceWorker, Arc<ScriptedNetwork>) {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = Arc::new(ScriptedNetwork::new());
        network.respond(url("/index.html"), 200, "<html>shell</html>");
        network.respond(url("/app.js"), 200, "console.log(1)");

        let manifest = PrecacheManifest::new(["/index.html", "/app.js"]).unwrap();
        let config = WorkerConfig::new(Url::parse(ORIGIN).unwrap(), manifest);
        let worker = ServiceWorker::new(config, db, network.clone()).await.unwrap();
        (worker, network)
    }

    #[test]
    fn test_resolve_url_errors() {
        let origin = Url::parse(ORIGIN).unwrap();
        assert!(matches!(super::resolve_url(&origin, "  "), Err(shellcache_core::Error::InvalidInput(_))));
        assert!(matches!(
            super::resolve_url(&origin, "ftp://learn.example/a"),
            Err(shellcache_core::Error::InvalidUrl(_))
        ));
        assert_eq!(super::resolve_url(&origin, "/a.json").unwrap(), url("/a.json"));
    }
}
