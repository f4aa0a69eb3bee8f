//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::{
    ShellClientParams, ShellDeployParams, ShellFetchParams,
    cache::{CacheGetParams, get_impl, keys_impl},
    close_impl, deploy_impl, fetch_impl, open_impl, status_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use shellcache_client::ServiceWorker;

/// The main MCP server handler for shellcache.
#[derive(Clone)]
pub struct ShellCacheServer {
    worker: ServiceWorker,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ShellCacheServer {
    /// Create a new server handler around a booted worker.
    pub fn new(worker: ServiceWorker) -> Self {
        Self { worker, tool_router: Self::tool_router() }
    }

    /// Issue a request through the worker as the application would.
    #[tool(
        description = "Fetch a URL through the offline cache worker. Returns status, body, and whether the answer came from the cache, the network, or the offline fallback."
    )]
    async fn shell_fetch(&self, params: Parameters<ShellFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    /// Install a new generation and activate it when skip-waiting is on.
    #[tool(
        description = "Install a cache generation: precache every manifest asset, then activate it and delete older generations. A failed install leaves the current generation serving."
    )]
    async fn shell_deploy(&self, params: Parameters<ShellDeployParams>) -> Result<CallToolResult, McpError> {
        deploy_impl(&self.worker, params.0).await
    }

    #[tool(description = "Report the active generation, lifecycle phase, stored generations, and open clients.")]
    async fn shell_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker).await
    }

    #[tool(
        description = "Register an open application instance. It is controlled by the active generation, or uncontrolled until the next activation claims it."
    )]
    async fn shell_client_open(&self, params: Parameters<ShellClientParams>) -> Result<CallToolResult, McpError> {
        open_impl(&self.worker, params.0).await
    }

    #[tool(description = "Unregister a closed application instance.")]
    async fn shell_client_close(&self, params: Parameters<ShellClientParams>) -> Result<CallToolResult, McpError> {
        close_impl(&self.worker, params.0).await
    }

    #[tool(description = "Read the cached response for a GET URL from the active generation.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.worker, params.0).await
    }

    #[tool(description = "List every URL cached in the active generation.")]
    async fn cache_keys(&self) -> Result<CallToolResult, McpError> {
        keys_impl(&self.worker).await
    }
}

impl ServerHandler for ShellCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
