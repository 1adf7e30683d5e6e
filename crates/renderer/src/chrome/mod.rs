// Chromium-backed renderer over the DevTools protocol

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use futures::StreamExt;
use snapshot_kit_core::{Error, RenderSettings, Result};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::idle::{SettlePolicy, network_events, wait_for_idle};
use crate::{RenderedDocument, Renderer};

/// How the browser is launched and when a page counts as rendered
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    pub executable: Option<PathBuf>,
    pub timeout: Duration,
    pub settle: SettlePolicy,
    /// Id of the node the client application mounts into
    pub content_root: String,
}

impl ChromeOptions {
    pub fn from_settings(render: &RenderSettings, content_root: &str) -> Self {
        Self {
            executable: render.chrome.clone(),
            timeout: render.timeout,
            settle: SettlePolicy {
                max_inflight: render.max_inflight,
                quiet: render.idle,
            },
            content_root: content_root.to_string(),
        }
    }
}

fn browser_error(err: impl std::fmt::Display) -> Error {
    Error::Browser(err.to_string())
}

fn render_error(url: &str, err: impl std::fmt::Display) -> Error {
    Error::Render {
        url: url.to_string(),
        message: err.to_string(),
    }
}

/// One browser process and one page, reused for every route of a run
pub struct ChromeRenderer {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    options: ChromeOptions,
}

impl ChromeRenderer {
    /// Launch a headless browser with the sandbox disabled, which constrained
    /// environments (containers, CI) require.
    pub async fn launch(options: ChromeOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .new_headless_mode()
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .request_timeout(options.timeout);
        if let Some(executable) = &options.executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(Error::Browser)?;

        let (mut browser, mut events) = Browser::launch(config).await.map_err(browser_error)?;

        // The handler drives the websocket connection and must be polled for
        // the whole session
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    tracing::debug!("DevTools handler error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    tracing::debug!("Closing browser after failed launch: {}", close_err);
                }
                handler.abort();
                return Err(browser_error(e));
            }
        };

        tracing::info!("Browser launched");
        Ok(Self {
            browser,
            handler,
            page,
            options,
        })
    }

    /// Navigate and wait for the network to settle
    async fn load(&self, url: &str) -> Result<()> {
        let started = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(browser_error)?;
        let finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(browser_error)?;
        let failed = self
            .page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(browser_error)?;

        let events = network_events(
            started.map(|ev| ev.request_id.inner().clone()),
            finished.map(|ev| ev.request_id.inner().clone()),
            failed.map(|ev| ev.request_id.inner().clone()),
        );

        tracing::info!("Loading: {}", url);
        self.page.goto(url).await.map_err(|e| render_error(url, e))?;
        wait_for_idle(events, self.options.settle).await;
        Ok(())
    }

    async fn content_present(&self, url: &str) -> Result<bool> {
        let root_id = serde_json::Value::String(self.options.content_root.clone());
        let script = format!(
            "(() => {{ const root = document.getElementById({}); return !!root && root.children.length > 0; }})()",
            root_id
        );

        self.page
            .evaluate(script.as_str())
            .await
            .map_err(|e| render_error(url, e))?
            .into_value::<bool>()
            .map_err(|e| render_error(url, e))
    }

    /// Shut the browser down. Called once every route has been attempted.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Waiting for browser exit: {}", e);
        }
        if let Err(e) = self.handler.await
            && !e.is_cancelled()
        {
            tracing::debug!("DevTools handler task ended abnormally: {}", e);
        }
        tracing::info!("Browser closed");
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&mut self, url: &str) -> Result<RenderedDocument> {
        let timeout = self.options.timeout;
        match tokio::time::timeout(timeout, self.load(url)).await {
            Ok(loaded) => loaded?,
            Err(_) => {
                return Err(Error::Timeout {
                    url: url.to_string(),
                    after: timeout,
                });
            }
        }
        tracing::info!("Page loaded, checking content...");

        let content_present = self.content_present(url).await?;
        if !content_present {
            tracing::warn!(
                "Warning: #{} element not found or empty. Capturing the document as rendered.",
                self.options.content_root
            );
        }

        let html = self.page.content().await.map_err(|e| render_error(url, e))?;
        tracing::info!("Content retrieved successfully");

        Ok(RenderedDocument {
            url: url.to_string(),
            html,
            content_present,
        })
    }
}
