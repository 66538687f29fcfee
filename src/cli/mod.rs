//! Command implementations behind the binary's argument surface.

pub mod batch_cmd;
pub mod collect_cmd;

use tracing::warn;

use crate::browser::{ChromiumCollector, MockCollector, ProfileFetcher};
use crate::config::CollectorConfig;
use crate::error::CollectResult;

/// Build the configured fetcher: canned captures when `--mock` is set, a
/// real headless browser otherwise.
async fn build_fetcher(config: &CollectorConfig) -> CollectResult<Box<dyn ProfileFetcher>> {
    if config.use_mock {
        warn!("mock browser in use; no network traffic will occur");
        return Ok(Box::new(MockCollector::sample()));
    }
    Ok(Box::new(ChromiumCollector::launch(config).await?))
}

/// Shut the fetcher down without masking an earlier command error.
async fn shutdown_quietly(fetcher: Box<dyn ProfileFetcher>) {
    if let Err(e) = fetcher.shutdown().await {
        warn!(error = %e, "fetcher shutdown failed");
    }
}
