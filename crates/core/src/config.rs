use crate::error::{Error, Result};
use crate::types::*;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Raw TOML configuration structure
/// This matches the snapshot.toml file structure exactly
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    routes: Option<Vec<String>>,
    site: RawSite,
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    render: RawRender,
    #[serde(default)]
    locales: BTreeMap<String, LocaleBundle>,
}

#[derive(Debug, Deserialize)]
struct RawSite {
    #[serde(default = "default_dist")]
    dist: String,
    #[serde(default = "default_entry")]
    entry: String,
    #[serde(default = "default_content_root")]
    content_root: String,
    default_locale: String,
}

#[derive(Debug, Deserialize)]
struct RawServer {
    #[serde(default = "default_host")]
    host: IpAddr,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for RawServer {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRender {
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default = "default_idle_ms")]
    idle_ms: u64,
    #[serde(default = "default_max_inflight")]
    max_inflight: usize,
    chrome: Option<String>,
}

impl Default for RawRender {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            idle_ms: default_idle_ms(),
            max_inflight: default_max_inflight(),
            chrome: None,
        }
    }
}

fn default_dist() -> String {
    "dist".to_string()
}

fn default_entry() -> String {
    "index.html".to_string()
}

fn default_content_root() -> String {
    "root".to_string()
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    3333
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_idle_ms() -> u64 {
    500
}

fn default_max_inflight() -> usize {
    2
}

/// Parse snapshot.toml from a file path.
///
/// A relative `site.dist` is resolved against the directory holding the
/// config file, so the tool behaves the same from any working directory.
pub fn parse_snapshot_toml<P: AsRef<Path>>(path: P) -> Result<SnapshotConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let mut config = parse_snapshot_toml_str(&content)?;

    if config.site.dist.is_relative() {
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.site.dist = base.join(&config.site.dist);
    }

    Ok(config)
}

/// Parse snapshot.toml from a string (useful for testing)
pub fn parse_snapshot_toml_str(content: &str) -> Result<SnapshotConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    let default_locale = raw.site.default_locale.trim().to_string();
    if default_locale.is_empty() {
        return Err(Error::Config("site.default_locale must not be empty".into()));
    }
    if !raw.locales.contains_key(&default_locale) {
        return Err(Error::Config(format!(
            "Default locale '{}' has no [locales.{}] bundle",
            default_locale, default_locale
        )));
    }
    for tag in raw.locales.keys() {
        validate_locale_tag(tag)?;
    }

    let entry = validate_entry(&raw.site.entry)?;
    if raw.site.content_root.trim().is_empty() {
        return Err(Error::Config("site.content_root must not be empty".into()));
    }

    let tags: Vec<String> = raw.locales.keys().cloned().collect();

    // Without an explicit list: the root for the default locale, then one
    // prefixed route per other locale
    let raw_routes = raw.routes.unwrap_or_else(|| {
        std::iter::once("/".to_string())
            .chain(
                tags.iter()
                    .filter(|tag| **tag != default_locale)
                    .map(|tag| format!("/{}", tag)),
            )
            .collect()
    });

    if raw_routes.is_empty() {
        return Err(Error::Config("routes must list at least one route".into()));
    }

    let mut seen = HashSet::new();
    let mut routes = Vec::with_capacity(raw_routes.len());
    for raw_route in &raw_routes {
        let path = normalize_route(raw_route)?;
        if !seen.insert(path.clone()) {
            return Err(Error::Config(format!("Duplicate route '{}'", path)));
        }
        routes.push(Route::new(path, &default_locale, &tags));
    }

    if raw.render.timeout_secs == 0 {
        return Err(Error::Config("render.timeout_secs must be greater than 0".into()));
    }

    let chrome = raw
        .render
        .chrome
        .filter(|c| !c.trim().is_empty())
        .map(PathBuf::from);

    Ok(SnapshotConfig {
        site: SiteSettings {
            dist: PathBuf::from(raw.site.dist),
            entry,
            content_root: raw.site.content_root,
            default_locale,
        },
        server: ServerSettings {
            host: raw.server.host,
            port: raw.server.port,
        },
        render: RenderSettings {
            timeout: Duration::from_secs(raw.render.timeout_secs),
            idle: Duration::from_millis(raw.render.idle_ms),
            max_inflight: raw.render.max_inflight,
            chrome,
        },
        routes,
        locales: raw.locales,
    })
}

/// Normalize a route path.
///
/// Rejects:
/// - Paths not starting with `/`
/// - Parent directory references (`..`) and `.` segments
/// - Query strings and fragments
///
/// Empty segments collapse and a trailing slash is dropped, so `/en/` and
/// `//en` both become `/en`.
pub fn normalize_route(raw: &str) -> Result<String> {
    let trimmed = raw.trim();

    if !trimmed.starts_with('/') {
        return Err(Error::Config(format!(
            "Route '{}' must start with '/'",
            raw
        )));
    }

    if trimmed.contains(['?', '#', '\\']) {
        return Err(Error::Config(format!(
            "Route '{}' must be a plain path (no query, fragment or backslash)",
            raw
        )));
    }

    let mut segments = Vec::new();
    for segment in trimmed.split('/').filter(|s| !s.is_empty()) {
        if segment == ".." || segment == "." {
            return Err(Error::Config(format!(
                "Parent directory references (..) not allowed in route '{}'",
                raw
            )));
        }
        segments.push(segment);
    }

    Ok(format!("/{}", segments.join("/")))
}

/// The entry document name must stay inside the dist directory
fn validate_entry(entry: &str) -> Result<String> {
    let path = Path::new(entry);

    if entry.trim().is_empty() {
        return Err(Error::Config("Empty path in 'site.entry' field".into()));
    }

    if path.is_absolute() {
        return Err(Error::Config(format!(
            "Absolute paths not allowed in 'site.entry': '{}'",
            entry
        )));
    }

    for component in path.components() {
        if component == std::path::Component::ParentDir {
            return Err(Error::Config(format!(
                "Parent directory references (..) not allowed in 'site.entry': '{}'",
                entry
            )));
        }
    }

    Ok(entry.to_string())
}

/// Locale tags become path segments, so keep them to letters, digits and `-`/`_`
fn validate_locale_tag(tag: &str) -> Result<()> {
    if tag.is_empty()
        || !tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::Config(format!(
            "Invalid locale tag '{}': use letters, digits, '-' or '_'",
            tag
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLES: &str = r##"
[locales.fr]
title = "Micro PC Plus"
description = "Vente et réparation d'ordinateurs à Montréal."
canonical = "https://micropcplus.com"
og_title = "Micro PC Plus - Vente et Réparation"
og_description = "Services de vente et réparation."
og_locale = "fr_CA"
structured_description = "Services de vente à Montréal"

[locales.en]
title = "Micro PC Plus | Computer Sales & Repair Services"
description = "Computer sales and repairs in Montreal."
canonical = "https://micropcplus.com/en"
og_title = "Micro PC Plus - Computer Sales & Repair"
og_description = "Computer sales and repair services."
og_locale = "en_CA"
structured_description = "Computer sales in Montreal"
"##;

    fn config_with(head: &str) -> String {
        format!("{}\n{}", head, BUNDLES)
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml = config_with(
            r#"
[site]
default_locale = "fr"
"#,
        );

        let config = parse_snapshot_toml_str(&toml).unwrap();
        assert_eq!(config.site.dist, PathBuf::from("dist"));
        assert_eq!(config.site.entry, "index.html");
        assert_eq!(config.site.content_root, "root");
        assert_eq!(config.server.port, 3333);
        assert_eq!(config.render.timeout, Duration::from_secs(60));
        assert_eq!(config.render.idle, Duration::from_millis(500));
        assert_eq!(config.render.max_inflight, 2);

        let paths: Vec<&str> = config.routes.iter().map(Route::path).collect();
        assert_eq!(paths, vec!["/", "/en"]);
        assert_eq!(config.routes[0].locale(), "fr");
        assert_eq!(config.routes[1].locale(), "en");
    }

    #[test]
    fn test_parse_explicit_routes_keep_order() {
        let toml = config_with(
            r#"
routes = ["/en/", "/"]

[site]
default_locale = "fr"

[server]
port = 4000
"#,
        );

        let config = parse_snapshot_toml_str(&toml).unwrap();
        let paths: Vec<&str> = config.routes.iter().map(Route::path).collect();
        assert_eq!(paths, vec!["/en", "/"]);
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.prefixed_locales(), vec!["en".to_string()]);
    }

    #[test]
    fn test_parse_rejects_missing_bundle_field() {
        let toml = r#"
[site]
default_locale = "fr"

[locales.fr]
title = "Micro PC Plus"
description = "desc"
canonical = "https://micropcplus.com"
og_title = "t"
og_locale = "fr_CA"
structured_description = "sd"
"#;

        let result = parse_snapshot_toml_str(toml);
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(result.unwrap_err().to_string().contains("og_description"));
    }

    #[test]
    fn test_parse_rejects_default_locale_without_bundle() {
        let toml = config_with(
            r#"
[site]
default_locale = "de"
"#,
        );

        let result = parse_snapshot_toml_str(&toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("'de'"));
    }

    #[test]
    fn test_parse_unprefixed_route_belongs_to_default_locale() {
        let toml = config_with(
            r#"
routes = ["/", "/de/contact", "/services"]

[site]
default_locale = "fr"
"#,
        );

        let config = parse_snapshot_toml_str(&toml).unwrap();
        let locales: Vec<&str> = config.routes.iter().map(Route::locale).collect();
        assert_eq!(locales, vec!["fr", "fr", "fr"]);
        for route in &config.routes {
            assert!(config.bundle_for(route).is_ok());
        }
    }

    #[test]
    fn test_parse_rejects_duplicate_routes() {
        let toml = config_with(
            r#"
routes = ["/", "/en", "/en/"]

[site]
default_locale = "fr"
"#,
        );

        let result = parse_snapshot_toml_str(&toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Duplicate route"));
    }

    #[test]
    fn test_parse_rejects_entry_outside_dist() {
        let toml = config_with(
            r#"
[site]
default_locale = "fr"
entry = "../index.html"
"#,
        );

        let result = parse_snapshot_toml_str(&toml);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Parent directory references")
        );
    }

    #[test]
    fn test_normalize_route() {
        assert_eq!(normalize_route("/").unwrap(), "/");
        assert_eq!(normalize_route("/en").unwrap(), "/en");
        assert_eq!(normalize_route("/en/").unwrap(), "/en");
        assert_eq!(normalize_route("//en//services/").unwrap(), "/en/services");
        assert_eq!(normalize_route("  /en ").unwrap(), "/en");
    }

    #[test]
    fn test_normalize_route_rejects_unsafe_paths() {
        assert!(normalize_route("en").is_err());
        assert!(normalize_route("").is_err());
        assert!(normalize_route("/../etc").is_err());
        assert!(normalize_route("/en/./x").is_err());
        assert!(normalize_route("/en?x=1").is_err());
        assert!(normalize_route("/en#top").is_err());
    }

    #[test]
    fn test_parse_snapshot_toml_resolves_dist_next_to_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("snapshot.toml");
        fs::write(
            &config_path,
            config_with(
                r#"
[site]
default_locale = "fr"
dist = "build/out"
"#,
            ),
        )
        .unwrap();

        let config = parse_snapshot_toml(&config_path).unwrap();
        assert_eq!(config.site.dist, dir.path().join("build/out"));
        assert_eq!(
            config.entry_path(),
            dir.path().join("build/out/index.html")
        );
    }

    #[test]
    fn test_bundle_for_route() {
        let toml = config_with(
            r#"
[site]
default_locale = "fr"
"#,
        );
        let config = parse_snapshot_toml_str(&toml).unwrap();

        let en = config.bundle_for(&config.routes[1]).unwrap();
        assert_eq!(en.og_locale, "en_CA");
        assert_eq!(en.social_url(), "https://micropcplus.com/en");
    }
}
