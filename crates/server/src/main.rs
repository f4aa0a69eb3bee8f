//! shellcache server entry point.
//!
//! Boots the worker over the configured cache database, deploys the
//! configured generation, and serves the MCP tools on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{FetchClient, FetchConfig, ServiceWorker, WorkerConfig};
use shellcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(origin = %config.origin, db = %config.db_path.display(), "starting shellcache on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let worker = ServiceWorker::new(WorkerConfig::from_app_config(&config)?, db, network).await?;

    // A failed deploy leaves the previous generation serving.
    match worker.deploy(&config.generation).await {
        Ok(report) => tracing::info!(generation = %report.install.generation, "startup deploy finished"),
        Err(e) => tracing::error!(generation = %config.generation, "startup deploy failed: {e}"),
    }

    let handler = handler::ShellCacheServer::new(worker);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
