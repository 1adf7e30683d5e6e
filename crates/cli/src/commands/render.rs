use anyhow::Result;
use snapshot_kit_core::{BatchReport, SnapshotConfig};
use snapshot_kit_renderer::{ChromeOptions, ChromeRenderer};
use std::path::PathBuf;

use super::{ensure_dist, load_config};
use crate::host::{FileHost, RewriteRules};
use crate::pipeline::render_routes;

/// Snapshot every route through a headless browser.
///
/// This command:
/// - Fails before touching anything if the dist directory is missing
/// - Serves dist on a local port with locale rewrites
/// - Renders each route in order, strips scripts, writes `index.html`
/// - Closes the browser and the server whatever the routes did
///
/// # Arguments
///
/// * `config_path` - Path to snapshot.toml
/// * `port` - Overrides `server.port`
pub async fn run(config_path: PathBuf, port: Option<u16>) -> Result<()> {
    let config = load_config(&config_path)?;
    ensure_dist(&config)?;

    let mut addr = config.server.addr();
    if let Some(port) = port {
        addr.set_port(port);
    }

    let host = FileHost::start(RewriteRules::from_config(&config), addr).await?;
    let outcome = render_with_browser(&config, &host.base_url()).await;
    if let Err(e) = host.shutdown().await {
        tracing::warn!("{:#}", e);
    }

    let report = outcome?;
    tracing::info!(
        "Static rendering complete: {} written, {} failed",
        report.written.len(),
        report.failed.len()
    );
    for failure in &report.failed {
        tracing::info!("  {} failed: {}", failure.route, failure.message);
    }

    Ok(())
}

async fn render_with_browser(config: &SnapshotConfig, base_url: &str) -> Result<BatchReport> {
    let options = ChromeOptions::from_settings(&config.render, &config.site.content_root);
    let mut renderer = ChromeRenderer::launch(options).await?;

    let report = render_routes(&mut renderer, base_url, &config.routes, &config.site.dist).await;
    renderer.close().await;

    Ok(report)
}
