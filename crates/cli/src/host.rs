use anyhow::{Context, Result};
use axum::{
    Router,
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use snapshot_kit_core::SnapshotConfig;
use std::convert::Infallible;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::{ServiceExt, service_fn};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Maps request paths onto the dist directory.
///
/// Existing files are served as they are. Everything else gets an entry
/// document: `/{locale}` and `/{locale}/**` get that locale's entry when it
/// has been generated, all other paths the default entry at the root.
#[derive(Debug, Clone)]
pub struct RewriteRules {
    root: PathBuf,
    entry: String,
    locales: Vec<String>,
}

impl RewriteRules {
    pub fn new(root: impl Into<PathBuf>, entry: impl Into<String>, locales: Vec<String>) -> Self {
        Self {
            root: root.into(),
            entry: entry.into(),
            locales,
        }
    }

    pub fn from_config(config: &SnapshotConfig) -> Self {
        Self::new(
            &config.site.dist,
            &config.site.entry,
            config.prefixed_locales(),
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` names a regular file inside the root.
    /// Asset names are matched literally, without percent-decoding.
    pub fn is_static_asset(&self, path: &str) -> bool {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative.as_os_str().is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return false;
        }
        self.root.join(relative).is_file()
    }

    /// Entry document answering a non-asset request
    pub fn entry_for(&self, path: &str) -> PathBuf {
        let first = path
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default();

        if let Some(locale) = self.locales.iter().find(|l| l.as_str() == first) {
            let localized = self.root.join(locale).join(&self.entry);
            if localized.is_file() {
                return localized;
            }
            tracing::debug!(
                "{} missing, serving the default entry",
                localized.display()
            );
        }

        self.root.join(&self.entry)
    }
}

async fn serve(rules: Arc<RewriteRules>, req: Request<Body>) -> Result<Response, Infallible> {
    let path = req.uri().path().to_string();

    if rules.is_static_asset(&path) {
        return Ok(ServeDir::new(rules.root()).oneshot(req).await.into_response());
    }

    let entry = rules.entry_for(&path);
    Ok(ServeFile::new(entry).oneshot(req).await.into_response())
}

fn router(rules: RewriteRules) -> Router {
    let rules = Arc::new(rules);
    Router::new()
        .fallback_service(service_fn(move |req: Request<Body>| {
            serve(rules.clone(), req)
        }))
        .layer(TraceLayer::new_for_http())
}

/// Local HTTP server over the dist directory, alive for one batch.
///
/// The listener is bound before [`FileHost::start`] returns, so callers can
/// connect immediately. Call [`FileHost::shutdown`] to release the port; a
/// host that is merely dropped aborts its server task.
pub struct FileHost {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl FileHost {
    pub async fn start(rules: RewriteRules, addr: SocketAddr) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        let addr = listener
            .local_addr()
            .context("Failed to read bound address")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = router(rules);
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let host = Self {
            addr,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        };
        tracing::info!("Local server started on {}", host.base_url());
        Ok(host)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// URL prefix for routes; an unspecified bind address is reached via
    /// loopback
    pub fn base_url(&self) -> String {
        let mut addr = self.local_addr();
        if addr.ip().is_unspecified() {
            addr.set_ip(Ipv4Addr::LOCALHOST.into());
        }
        format!("http://{}", addr)
    }

    /// Stop accepting connections and wait for the server task to finish
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await
                .context("File host task failed")?
                .context("File host error")?;
        }
        tracing::info!("Local server stopped");
        Ok(())
    }
}

impl Drop for FileHost {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("en")).unwrap();
        fs::create_dir_all(root.join("assets")).unwrap();
        fs::write(root.join("index.html"), "<html lang=\"fr\">accueil</html>").unwrap();
        fs::write(root.join("en").join("index.html"), "<html lang=\"en\">home</html>").unwrap();
        fs::write(root.join("assets").join("app.js"), "console.log('app')").unwrap();
        dir
    }

    fn rules(root: &Path) -> RewriteRules {
        RewriteRules::new(root, "index.html", vec!["en".to_string()])
    }

    #[test]
    fn test_entry_for_locale_prefix() {
        let dir = site();
        let rules = rules(dir.path());

        let en = dir.path().join("en").join("index.html");
        let fr = dir.path().join("index.html");
        assert_eq!(rules.entry_for("/en"), en);
        assert_eq!(rules.entry_for("/en/"), en);
        assert_eq!(rules.entry_for("/en/services/repair"), en);
        assert_eq!(rules.entry_for("/"), fr);
        assert_eq!(rules.entry_for("/english"), fr);
        assert_eq!(rules.entry_for("/contact"), fr);
    }

    #[test]
    fn test_entry_for_missing_locale_entry_falls_back() {
        let dir = site();
        fs::remove_file(dir.path().join("en").join("index.html")).unwrap();

        let rules = rules(dir.path());
        assert_eq!(rules.entry_for("/en"), dir.path().join("index.html"));
    }

    #[test]
    fn test_is_static_asset() {
        let dir = site();
        let rules = rules(dir.path());

        assert!(rules.is_static_asset("/assets/app.js"));
        assert!(rules.is_static_asset("/index.html"));
        assert!(!rules.is_static_asset("/"));
        assert!(!rules.is_static_asset("/en"));
        assert!(!rules.is_static_asset("/assets/missing.js"));
        assert!(!rules.is_static_asset("/../etc/passwd"));
    }

    #[tokio::test]
    async fn test_host_serves_assets_and_rewrites() {
        let dir = site();
        let host = FileHost::start(
            rules(dir.path()),
            SocketAddr::from(([127, 0, 0, 1], 0)),
        )
        .await
        .unwrap();
        let base = host.base_url();

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .unwrap();
        let fetch = |path: &str| {
            let request = client.get(format!("{}{}", base, path));
            async move {
                let response = request.send().await.unwrap();
                assert!(response.status().is_success());
                response.text().await.unwrap()
            }
        };

        assert_eq!(fetch("/").await, "<html lang=\"fr\">accueil</html>");
        assert_eq!(fetch("/en").await, "<html lang=\"en\">home</html>");
        assert_eq!(fetch("/en/contact").await, "<html lang=\"en\">home</html>");
        assert_eq!(fetch("/services").await, "<html lang=\"fr\">accueil</html>");
        assert_eq!(fetch("/assets/app.js").await, "console.log('app')");

        let addr = host.local_addr();
        drop(client);
        host.shutdown().await.unwrap();

        // Port is free again once shutdown returns
        std::net::TcpListener::bind(addr).unwrap();
    }

    #[tokio::test]
    async fn test_host_reports_bind_failure() {
        let dir = site();
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap();

        let result = FileHost::start(rules(dir.path()), addr).await;
        assert!(result.is_err());
    }
}
