//! shell_status tool implementation.

use rmcp::ErrorData as McpError;
use rmcp::model::CallToolResult;
use shellcache_client::ServiceWorker;

use super::json_result;

/// Implementation of the shell_status tool.
pub async fn status_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let status = worker.status().await?;
    json_result(&status)
}
