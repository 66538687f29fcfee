//! `ofindex batch <file>`

use std::path::Path;

use crate::config::CollectorConfig;
use crate::error::CollectResult;
use crate::{batch, storage, targets};

pub async fn run(config: &CollectorConfig, file: &Path) -> CollectResult<()> {
    let list = targets::load_targets(file)?;
    let store = storage::open_store(&config.backend).await?;
    let fetcher = super::build_fetcher(config).await?;

    let summary = batch::run_batch(fetcher.as_ref(), store.as_ref(), config, &list).await;
    super::shutdown_quietly(fetcher).await;

    println!("{}", summary.report());
    Ok(())
}
