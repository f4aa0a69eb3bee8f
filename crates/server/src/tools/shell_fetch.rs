//! shell_fetch tool implementation.
//!
//! Issues a request through the worker exactly as the application would,
//! and reports where the answer came from.

use rmcp::ErrorData as McpError;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{Classification, FetchRequest, Interception, ResponseSource, ServiceWorker};

use super::{body_text, json_result, resolve_url};

/// Input parameters for the shell_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShellFetchParams {
    /// Absolute URL, or a root-relative path resolved against the origin.
    pub url: String,

    /// HTTP method (default: GET). Anything but GET passes through uncached.
    #[serde(default = "default_method")]
    pub method: String,

    /// Treat the request as a top-level page navigation.
    #[serde(default)]
    pub navigate: bool,

    /// Application instance issuing the request.
    #[serde(default)]
    pub client_id: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the shell_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShellFetchOutput {
    /// The resolved request URL.
    pub url: String,
    pub method: String,
    /// `"large_media"`, `"static_asset"`, or `"pass_through"`.
    pub route: String,
    /// `"cache"`, `"network"`, or `"offline"`.
    pub source: String,
    pub status: u16,
    pub content_type: Option<String>,
    /// Body text, when the body is valid UTF-8.
    pub body: Option<String>,
    pub body_len: usize,
}

fn route_name(classification: Option<Classification>) -> &'static str {
    match classification {
        Some(Classification::LargeMedia) => "large_media",
        Some(Classification::StaticAsset) => "static_asset",
        None => "pass_through",
    }
}

fn source_name(source: ResponseSource) -> &'static str {
    match source {
        ResponseSource::Cache => "cache",
        ResponseSource::Network => "network",
        ResponseSource::Offline => "offline",
    }
}

/// Implementation of the shell_fetch tool.
pub async fn fetch_impl(worker: &ServiceWorker, params: ShellFetchParams) -> Result<CallToolResult, McpError> {
    let url = resolve_url(worker.router().origin(), &params.url)?;

    let resolved = url.to_string();
    let mut request = FetchRequest::new(&params.method, url);
    request.navigate = params.navigate;
    if let Some(client) = params.client_id {
        request = request.with_client(client);
    }

    let (classification, response) = match worker.intercept(request).await {
        Interception::Respond(pending) => (Some(pending.classification()), pending.await),
        Interception::PassThrough(request) => (None, worker.fetch(request).await?),
    };

    tracing::debug!(url = %resolved, source = source_name(response.source), status = response.snapshot.status, "shell_fetch");

    let output = ShellFetchOutput {
        url: resolved,
        method: params.method.to_ascii_uppercase(),
        route: route_name(classification).into(),
        source: source_name(response.source).into(),
        status: response.snapshot.status,
        content_type: response.snapshot.content_type().map(str::to_string),
        body: body_text(&response.snapshot),
        body_len: response.snapshot.body.len(),
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tests::{output_text, test_worker, url};

    fn params(target: &str) -> ShellFetchParams {
        ShellFetchParams { url: target.into(), method: default_method(), navigate: false, client_id: None }
    }

    fn parse(result: CallToolResult) -> ShellFetchOutput {
        serde_json::from_str(&output_text(&result)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let (worker, _network) = test_worker().await;
        assert!(fetch_impl(&worker, params("")).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_serves_precached_asset() {
        let (worker, network) = test_worker().await;
        worker.deploy("v6").await.unwrap();
        network.set_offline(true);

        let output = parse(fetch_impl(&worker, params("/app.js")).await.unwrap());
        assert_eq!(output.route, "static_asset");
        assert_eq!(output.source, "cache");
        assert_eq!(output.status, 200);
        assert_eq!(output.body.as_deref(), Some("console.log(1)"));
        assert_eq!(output.url, url("/app.js").to_string());
    }

    #[tokio::test]
    async fn test_fetch_offline_media() {
        let (worker, network) = test_worker().await;
        worker.deploy("v6").await.unwrap();
        network.set_offline(true);

        let output = parse(fetch_impl(&worker, params("/audio/lesson-1.mp3")).await.unwrap());
        assert_eq!(output.route, "large_media");
        assert_eq!(output.source, "offline");
        assert_eq!(output.status, 503);
        assert_eq!(output.body.as_deref(), Some("Offline. File unavailable."));
    }

    #[tokio::test]
    async fn test_fetch_navigation_offline_shell() {
        let (worker, network) = test_worker().await;
        worker.deploy("v6").await.unwrap();
        network.set_offline(true);

        let request = ShellFetchParams { navigate: true, ..params("/lessons/3") };
        let output = parse(fetch_impl(&worker, request).await.unwrap());
        assert_eq!(output.status, 200);
        assert_eq!(output.body.as_deref(), Some("<html>shell</html>"));
    }

    #[tokio::test]
    async fn test_fetch_post_passes_through() {
        let (worker, network) = test_worker().await;
        worker.deploy("v6").await.unwrap();
        network.respond(url("/api/progress"), 201, "ok");

        let request = ShellFetchParams { method: "post".into(), ..params("/api/progress") };
        let output = parse(fetch_impl(&worker, request).await.unwrap());
        assert_eq!(output.route, "pass_through");
        assert_eq!(output.method, "POST");
        assert_eq!(output.source, "network");
        assert_eq!(output.status, 201);
    }

    #[tokio::test]
    async fn test_fetch_pass_through_offline_is_error() {
        let (worker, network) = test_worker().await;
        network.set_offline(true);
        assert!(fetch_impl(&worker, params("/app.js")).await.is_err());
    }
}
