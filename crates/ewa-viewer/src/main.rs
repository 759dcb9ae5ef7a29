mod cache;
mod config;
mod error;
mod server;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ewa_backend::backend::BackendClient;

use cache::DocumentCache;
use config::Config;
use server::ViewerServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting ewa-viewer MCP server");

    let config = Config::from_env()?;
    info!(
        extract_header = config.extract_header,
        heuristics = ?config.heuristics,
        cache_size = config.cache_size,
        "configuration loaded"
    );

    let backend_config = config.backend_config();
    info!(
        api_base = %backend_config.api_base,
        timeout_ms = backend_config.timeout.as_millis(),
        max_retries = backend_config.max_retries,
        "backend client configured"
    );
    let backend = Arc::new(BackendClient::new(backend_config)?);

    let transformer = Arc::new(config.transformer());
    info!(heuristics = ?transformer.heuristics().names(), "document transformer ready");

    let cache = Arc::new(DocumentCache::new(config.cache_size));
    let server = ViewerServer::new(backend, transformer, cache);

    info!("MCP server ready, serving on stdio");
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!(error = %e, "MCP server error");
    })?;

    service.waiting().await?;
    info!("MCP server shut down");
    Ok(())
}
