use anyhow::{Context, Result};
use snapshot_kit_core::{BatchReport, SnapshotConfig, write_artifact};
use snapshot_kit_generator::patch_template;
use std::fs;
use std::path::PathBuf;

use super::{ensure_dist, load_config};

/// Write per-locale entry documents by patching metadata into the built
/// template. No browser involved.
pub async fn run(config_path: PathBuf) -> Result<()> {
    let config = load_config(&config_path)?;
    ensure_dist(&config)?;

    let entry = config.entry_path();
    let template = fs::read_to_string(&entry)
        .with_context(|| format!("Failed to read template {}", entry.display()))?;

    let report = patch_routes(&config, &template);
    tracing::info!(
        "Pre-rendering complete: {} written, {} failed",
        report.written.len(),
        report.failed.len()
    );

    Ok(())
}

/// Patch and write every route. The template is taken as read before the
/// batch, so overwriting the root entry does not affect later routes.
pub fn patch_routes(config: &SnapshotConfig, template: &str) -> BatchReport {
    let mut report = BatchReport::default();

    for route in &config.routes {
        tracing::info!("Pre-rendering route: {}", route);

        let written = config.bundle_for(route).and_then(|bundle| {
            let html = patch_template(template, route.locale(), bundle);
            let path = route.output_path(&config.site.dist);
            write_artifact(&path, &html)?;
            Ok(path)
        });

        match written {
            Ok(path) => report.record_written(route, path),
            Err(e) => report.record_failure(route, &e),
        }
    }

    report
}
