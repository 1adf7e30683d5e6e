use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Complete snapshot configuration, validated
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub site: SiteSettings,
    pub server: ServerSettings,
    pub render: RenderSettings,
    /// Routes in the order they are processed
    pub routes: Vec<Route>,
    pub locales: BTreeMap<String, LocaleBundle>,
}

impl SnapshotConfig {
    /// Locale bundle for a route. Validation guarantees presence for every
    /// configured route, so a miss here means the route came from elsewhere.
    pub fn bundle_for(&self, route: &Route) -> Result<&LocaleBundle> {
        self.locales.get(route.locale()).ok_or_else(|| {
            Error::Config(format!(
                "No locale bundle for '{}' (route {})",
                route.locale(),
                route.path()
            ))
        })
    }

    /// Locale tags served under their own path prefix (every locale except
    /// the default one)
    pub fn prefixed_locales(&self) -> Vec<String> {
        self.locales
            .keys()
            .filter(|tag| **tag != self.site.default_locale)
            .cloned()
            .collect()
    }

    /// Absolute path of the entry document inside the dist directory
    pub fn entry_path(&self) -> PathBuf {
        self.site.dist.join(&self.site.entry)
    }
}

/// Where the built site lives and what it looks like
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub dist: PathBuf,
    pub entry: String,
    /// Id of the node the client application mounts into
    pub content_root: String,
    pub default_locale: String,
}

/// Local file host address
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: IpAddr,
    pub port: u16,
}

impl ServerSettings {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Headless rendering policy
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Upper bound for navigation plus settling
    pub timeout: Duration,
    /// Quiet window the network must hold before the page counts as settled
    pub idle: Duration,
    /// Requests still allowed in flight during the quiet window
    pub max_inflight: usize,
    /// Browser executable; auto-detected when unset
    pub chrome: Option<PathBuf>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            idle: Duration::from_millis(500),
            max_inflight: 2,
            chrome: None,
        }
    }
}

/// Per-language metadata written into a static document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleBundle {
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub og_title: String,
    pub og_description: String,
    /// Defaults to the canonical URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_url: Option<String>,
    /// Social metadata locale, e.g. `fr_CA`
    pub og_locale: String,
    pub structured_description: String,
}

impl LocaleBundle {
    pub fn social_url(&self) -> &str {
        self.og_url.as_deref().unwrap_or(&self.canonical)
    }
}

/// One of the fixed paths the pipeline renders or patches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    path: String,
    locale: String,
}

impl Route {
    /// Build a route from an already normalized path
    pub fn new(path: impl Into<String>, default_locale: &str, locales: &[String]) -> Self {
        let path = path.into();
        let locale = derive_locale(&path, default_locale, locales).to_string();
        Self { path, locale }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// `/` maps to `{root}/index.html`, `/en` to `{root}/en/index.html`
    pub fn output_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in self.path.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path.join("index.html")
    }

    /// Fully qualified URL of this route under `base`
    pub fn url(&self, base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), self.path)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// Locale of a path, decided by its first segment alone.
///
/// A first segment naming a configured locale other than the default selects
/// that locale; anything else belongs to the default locale.
pub fn derive_locale<'a>(path: &str, default_locale: &'a str, locales: &'a [String]) -> &'a str {
    let first = path.trim_start_matches('/').split('/').next().unwrap_or_default();
    locales
        .iter()
        .find(|tag| tag.as_str() == first && tag.as_str() != default_locale)
        .map(String::as_str)
        .unwrap_or(default_locale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locales() -> Vec<String> {
        vec!["en".to_string(), "fr".to_string()]
    }

    #[test]
    fn test_derive_locale_from_prefix() {
        let locales = locales();
        assert_eq!(derive_locale("/", "fr", &locales), "fr");
        assert_eq!(derive_locale("/en", "fr", &locales), "en");
        assert_eq!(derive_locale("/en/services", "fr", &locales), "en");
        assert_eq!(derive_locale("/english", "fr", &locales), "fr");
        assert_eq!(derive_locale("/fr", "fr", &locales), "fr");
        assert_eq!(derive_locale("/contact", "fr", &locales), "fr");
    }

    #[test]
    fn test_output_path_root() {
        let route = Route::new("/", "fr", &locales());
        assert_eq!(
            route.output_path(Path::new("/site/dist")),
            PathBuf::from("/site/dist/index.html")
        );
    }

    #[test]
    fn test_output_path_locale() {
        let route = Route::new("/en", "fr", &locales());
        assert_eq!(
            route.output_path(Path::new("/site/dist")),
            PathBuf::from("/site/dist/en/index.html")
        );
        assert_eq!(route.locale(), "en");
    }

    #[test]
    fn test_output_path_nested() {
        let route = Route::new("/en/services", "fr", &locales());
        assert_eq!(
            route.output_path(Path::new("dist")),
            PathBuf::from("dist/en/services/index.html")
        );
    }

    #[test]
    fn test_route_url() {
        let route = Route::new("/en", "fr", &locales());
        assert_eq!(route.url("http://localhost:3333"), "http://localhost:3333/en");
        assert_eq!(route.url("http://localhost:3333/"), "http://localhost:3333/en");
    }

    #[test]
    fn test_social_url_defaults_to_canonical() {
        let mut bundle = LocaleBundle {
            title: "t".into(),
            description: "d".into(),
            canonical: "https://example.com/en".into(),
            og_title: "ot".into(),
            og_description: "od".into(),
            og_url: None,
            og_locale: "en_CA".into(),
            structured_description: "sd".into(),
        };
        assert_eq!(bundle.social_url(), "https://example.com/en");

        bundle.og_url = Some("https://example.com/share".into());
        assert_eq!(bundle.social_url(), "https://example.com/share");
    }
}
