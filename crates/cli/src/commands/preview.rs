use anyhow::{Context, Result};
use std::path::PathBuf;

use super::{ensure_dist, load_config};
use crate::host::{FileHost, RewriteRules};

/// Serve the dist directory with the same rewrites the renderer sees, until
/// Ctrl+C.
pub async fn run(config_path: PathBuf, port: Option<u16>) -> Result<()> {
    let config = load_config(&config_path)?;
    ensure_dist(&config)?;

    let mut addr = config.server.addr();
    if let Some(port) = port {
        addr.set_port(port);
    }

    let host = FileHost::start(RewriteRules::from_config(&config), addr).await?;
    for route in &config.routes {
        tracing::info!("  {} -> {}", route, route.url(&host.base_url()));
    }
    tracing::info!("Press Ctrl+C to stop");

    let stopped = tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C");
    host.shutdown().await?;
    stopped
}
