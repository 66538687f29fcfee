//! Browser-driven page acquisition.
//!
//! [`ProfileFetcher`] is the seam between navigation and the rest of the
//! pipeline: the real implementation drives a headless Chromium over CDP,
//! the mock replays canned captures for tests and offline runs.

pub mod chromium;
pub mod mock;

pub use chromium::ChromiumCollector;
pub use mock::MockCollector;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CollectResult;

/// Everything one navigation produced: the winning intercepted API payload,
/// if any, and the rendered page source.
#[derive(Debug, Clone, Default)]
pub struct PageCapture {
    /// Decoded body of the last matching profile API response.
    pub payload: Option<Value>,
    /// Outer HTML after navigation settled. Empty when the page could not
    /// be serialized.
    pub html: String,
}

/// Fetches the raw material for one target's profile.
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    /// Navigate to the target's profile page and capture what it serves.
    async fn fetch(&self, username: &str) -> CollectResult<PageCapture>;

    /// Release browser resources. Consumes the fetcher; errors during
    /// teardown are reported, not swallowed.
    async fn shutdown(self: Box<Self>) -> CollectResult<()>;
}
