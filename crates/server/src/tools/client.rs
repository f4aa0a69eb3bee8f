//! shell_client_open / shell_client_close tool implementations.
//!
//! Application instances announce themselves so a later activation can
//! claim them. An instance opened while no generation is active stays
//! uncontrolled, and its requests pass through, until that claim.

use rmcp::ErrorData as McpError;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::ServiceWorker;
use shellcache_core::Error;

use super::json_result;

/// Parameters for the shell_client_open and shell_client_close tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShellClientParams {
    /// Identifier of the application instance, passed again as `client_id` to shell_fetch.
    pub client_id: String,
}

/// Output from the shell_client_open tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShellClientOpenOutput {
    pub client_id: String,
    /// Generation controlling the instance, or null while uncontrolled.
    pub controller: Option<String>,
}

/// Output from the shell_client_close tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShellClientCloseOutput {
    pub client_id: String,
    /// Whether the instance was registered.
    pub closed: bool,
}

fn client_id(params: &ShellClientParams) -> Result<&str, Error> {
    let id = params.client_id.trim();
    if id.is_empty() {
        return Err(Error::InvalidInput("client_id cannot be empty".into()));
    }
    Ok(id)
}

/// Implementation of the shell_client_open tool.
pub async fn open_impl(worker: &ServiceWorker, params: ShellClientParams) -> Result<CallToolResult, McpError> {
    let id = client_id(&params)?;
    let controller = worker.register_client(id).await;
    tracing::debug!(client = id, controller = ?controller, "client opened");

    json_result(&ShellClientOpenOutput { client_id: id.to_string(), controller })
}

/// Implementation of the shell_client_close tool.
pub async fn close_impl(worker: &ServiceWorker, params: ShellClientParams) -> Result<CallToolResult, McpError> {
    let id = client_id(&params)?;
    let closed = worker.unregister_client(id).await;

    json_result(&ShellClientCloseOutput { client_id: id.to_string(), closed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tests::{output_text, test_worker};
    use crate::tools::{ShellDeployParams, ShellFetchParams, deploy_impl, fetch_impl, status_impl};

    fn params(id: &str) -> ShellClientParams {
        ShellClientParams { client_id: id.into() }
    }

    fn json(result: CallToolResult) -> serde_json::Value {
        serde_json::from_str(&output_text(&result)).unwrap()
    }

    #[tokio::test]
    async fn test_open_empty_client_id() {
        let (worker, _network) = test_worker().await;
        assert!(open_impl(&worker, params(" ")).await.is_err());
    }

    #[tokio::test]
    async fn test_client_uncontrolled_until_deploy_claims_it() {
        let (worker, _network) = test_worker().await;

        let opened: ShellClientOpenOutput =
            serde_json::from_str(&output_text(&open_impl(&worker, params("tab-1")).await.unwrap())).unwrap();
        assert!(opened.controller.is_none());

        let status = json(status_impl(&worker).await.unwrap());
        assert_eq!(status["clients"], 1);
        assert_eq!(status["uncontrolled_clients"], 1);

        let report = json(deploy_impl(&worker, ShellDeployParams { generation: "v6".into() }).await.unwrap());
        assert_eq!(report["activation"]["claimed"], 1);

        let status = json(status_impl(&worker).await.unwrap());
        assert_eq!(status["uncontrolled_clients"], 0);
        assert_eq!(status["controller_changes"], 1);

        let fetch = ShellFetchParams {
            url: "/app.js".into(),
            method: "GET".into(),
            navigate: false,
            client_id: Some("tab-1".into()),
        };
        let output = json(fetch_impl(&worker, fetch).await.unwrap());
        assert_eq!(output["source"], "cache");

        let reopened: ShellClientOpenOutput =
            serde_json::from_str(&output_text(&open_impl(&worker, params("tab-2")).await.unwrap())).unwrap();
        assert_eq!(reopened.controller.as_deref(), Some("v6"));
    }

    #[tokio::test]
    async fn test_close_client() {
        let (worker, _network) = test_worker().await;
        open_impl(&worker, params("tab-1")).await.unwrap();

        let closed: ShellClientCloseOutput =
            serde_json::from_str(&output_text(&close_impl(&worker, params("tab-1")).await.unwrap())).unwrap();
        assert!(closed.closed);

        let again: ShellClientCloseOutput =
            serde_json::from_str(&output_text(&close_impl(&worker, params("tab-1")).await.unwrap())).unwrap();
        assert!(!again.closed);
        assert_eq!(json(status_impl(&worker).await.unwrap())["clients"], 0);
    }
}
