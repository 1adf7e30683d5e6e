pub mod init;
pub mod patch;
pub mod preview;
pub mod render;
pub mod validate;

use anyhow::{Context, Result};
use snapshot_kit_core::{Error, SnapshotConfig, parse_snapshot_toml};
use std::path::Path;

/// Load snapshot.toml, pointing at `init` when it is missing
fn load_config(path: &Path) -> Result<SnapshotConfig> {
    if !path.exists() {
        anyhow::bail!(
            "{} not found\nRun 'snapshot-kit init' first",
            path.display()
        );
    }

    let config = parse_snapshot_toml(path)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!(
        "Loaded {} ({} route(s), default locale '{}')",
        path.display(),
        config.routes.len(),
        config.site.default_locale
    );
    Ok(config)
}

/// The built site must exist before anything is started or written
fn ensure_dist(config: &SnapshotConfig) -> Result<()> {
    if !config.site.dist.is_dir() {
        return Err(Error::MissingDist(config.site.dist.clone()))
            .context("Build the site before running snapshot-kit");
    }
    Ok(())
}
