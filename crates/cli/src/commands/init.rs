use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "snapshot.toml";

/// Starting configuration: the shop site, French at the root and English
/// under /en
pub const SAMPLE_CONFIG: &str = r#"# snapshot-kit configuration

# Routes processed in order. Omit to get "/" plus one "/<locale>" per
# non-default locale.
routes = ["/", "/en"]

[site]
# Built site, relative to this file
dist = "dist"
entry = "index.html"
# Id of the element the client application mounts into
content_root = "root"
default_locale = "fr"

[server]
host = "127.0.0.1"
port = 3333

[render]
timeout_secs = 60
# Settled once at most max_inflight requests stay open for idle_ms
idle_ms = 500
max_inflight = 2
# chrome = "/usr/bin/chromium"

[locales.fr]
title = "Micro PC Plus"
description = "Micro PC Plus offre des services de vente d'ordinateurs, de réparations et de support technique à Montréal. Visitez-nous pour tous vos besoins en informatique, mobile et consoles de jeu."
canonical = "https://micropcplus.com"
og_title = "Micro PC Plus - Vente et Réparation d'Ordinateurs à Montréal"
og_description = "Services de vente, réparation et soutien technique pour ordinateurs, mobiles et consoles à Montréal."
og_locale = "fr_CA"
structured_description = "Services de vente, réparation et soutien technique pour ordinateurs à Montréal"

[locales.en]
title = "Micro PC Plus | Computer Sales & Repair Services"
description = "Micro PC Plus offers computer sales, repairs, and tech support services in Montreal. Visit us for all your computer, mobile, and gaming console needs."
canonical = "https://micropcplus.com/en"
og_title = "Micro PC Plus - Computer Sales & Repair in Montreal"
og_description = "Computer sales, repair and technical support services for computers, mobile devices and consoles in Montreal."
og_locale = "en_CA"
structured_description = "Computer sales, repairs, and tech support services in Montreal"
"#;

/// Write a sample snapshot.toml into `path`.
///
/// An existing file is kept unless `force` is set.
pub async fn run(path: PathBuf, force: bool) -> Result<()> {
    fs::create_dir_all(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let config_path = path.join(CONFIG_FILE);
    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists\nUse --force to overwrite it",
            config_path.display()
        );
    }

    fs::write(&config_path, SAMPLE_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    tracing::info!("Created {}", config_path.display());
    tracing::info!("Next: build the site into dist/, then run 'snapshot-kit validate'");
    Ok(())
}
