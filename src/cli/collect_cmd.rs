//! `ofindex collect <username>`

use crate::config::CollectorConfig;
use crate::error::CollectResult;
use crate::{pipeline, storage};

pub async fn run(config: &CollectorConfig, username: &str) -> CollectResult<()> {
    let store = storage::open_store(&config.backend).await?;
    let fetcher = super::build_fetcher(config).await?;

    let result = pipeline::collect_one(fetcher.as_ref(), store.as_ref(), config, username).await;
    super::shutdown_quietly(fetcher).await;

    let stored = result?;
    println!(
        "stored snapshot {} for {} at {}",
        stored.id, stored.username, stored.created_at
    );
    Ok(())
}
