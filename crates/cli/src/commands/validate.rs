use snapshot_kit_validator::validate_site;
use std::path::PathBuf;

use super::load_config;

pub async fn run(config_path: PathBuf) -> anyhow::Result<()> {
    let config = load_config(&config_path)?;
    tracing::info!("Validating site at: {}", config.site.dist.display());

    let report = validate_site(&config);

    for line in &report.info {
        tracing::info!("{}", line);
    }
    for line in &report.warnings {
        tracing::warn!("{}", line);
    }
    for line in &report.errors {
        tracing::error!("{}", line);
    }

    if !report.is_ok() {
        anyhow::bail!("Validation failed with {} error(s)", report.errors.len());
    }

    tracing::info!(
        "✓ Site valid ({} warning(s))",
        report.warnings.len()
    );
    Ok(())
}
