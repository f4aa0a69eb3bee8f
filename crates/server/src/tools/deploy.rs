//! shell_deploy tool implementation.
//!
//! Installs a new generation and, when skip-waiting is on, activates it.

use rmcp::ErrorData as McpError;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::ServiceWorker;
use shellcache_core::Error;

use super::json_result;

/// Input parameters for the shell_deploy tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShellDeployParams {
    /// Name of the generation to install, e.g. "v7".
    pub generation: String,
}

/// Implementation of the shell_deploy tool.
///
/// A failed install is reported as `INSTALL_FAILED`; the previously active
/// generation keeps serving.
pub async fn deploy_impl(worker: &ServiceWorker, params: ShellDeployParams) -> Result<CallToolResult, McpError> {
    let generation = params.generation.trim();
    if generation.is_empty() {
        return Err(Error::InvalidInput("generation cannot be empty".into()).into());
    }

    let report = worker.deploy(generation).await?;
    json_result(&report)
}
