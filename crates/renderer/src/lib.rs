// Headless rendering of client-side routes

pub mod chrome;
pub mod idle;

use async_trait::async_trait;
use snapshot_kit_core::Result;

pub use chrome::{ChromeOptions, ChromeRenderer};
pub use idle::{NetworkEvent, NetworkIdle, SettlePolicy, network_events, wait_for_idle};

/// A page captured after the client application settled
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub url: String,
    pub html: String,
    /// Whether the content root node existed with at least one child
    pub content_present: bool,
}

/// Produces fully realized documents for URLs.
///
/// Takes `&mut self` so one renderer only ever drives one navigation at a
/// time.
#[async_trait]
pub trait Renderer: Send {
    async fn render(&mut self, url: &str) -> Result<RenderedDocument>;
}
