//! Batch collection over a target list.
//!
//! Targets are processed strictly in order. A failing target is recorded
//! and skipped; only the summary reflects it. The run itself never errors
//! once it has started.

use tracing::{info, warn};

use crate::browser::ProfileFetcher;
use crate::config::CollectorConfig;
use crate::error::ErrorKind;
use crate::pipeline;
use crate::storage::SnapshotStore;

/// One target's failure, kept for the end-of-run report.
#[derive(Debug, Clone)]
pub struct TargetFailure {
    pub username: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// What a batch run did.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<TargetFailure>,
    /// Rate limit pauses taken during the run.
    pub pauses: usize,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn success_rate(&self) -> f64 {
        if self.processed() == 0 {
            return 0.0;
        }
        self.succeeded as f64 / self.processed() as f64 * 100.0
    }

    /// Human-readable report for the end of a run.
    pub fn report(&self) -> String {
        let mut out = format!(
            "processed {} targets: {} succeeded, {} failed ({:.1}% success rate)",
            self.processed(),
            self.succeeded,
            self.failed,
            self.success_rate()
        );
        if !self.failures.is_empty() {
            out.push_str("\nfailed targets:");
            for failure in &self.failures {
                out.push_str(&format!(
                    "\n  {} [{}]: {}",
                    failure.username, failure.kind, failure.message
                ));
            }
        }
        out
    }
}

/// Collect every target in order, pausing per the rate limit policy after
/// each full group when more targets remain.
pub async fn run_batch(
    fetcher: &dyn ProfileFetcher,
    store: &dyn SnapshotStore,
    config: &CollectorConfig,
    targets: &[String],
) -> RunSummary {
    let total = targets.len();
    let mut summary = RunSummary::default();

    for (index, username) in targets.iter().enumerate() {
        info!("[{}/{}] processing {}", index + 1, total, username);
        match pipeline::collect_one(fetcher, store, config, username).await {
            Ok(stored) => {
                info!("[{}/{}] {} -> snapshot {}", index + 1, total, username, stored.id);
                summary.succeeded += 1;
            }
            Err(err) => {
                warn!(target = %username, error = %err, "target failed");
                summary.failed += 1;
                summary.failures.push(TargetFailure {
                    username: username.clone(),
                    kind: err.kind(),
                    message: err.to_string(),
                });
            }
        }

        let processed = index + 1;
        if config.rate_limit.every > 0
            && processed % config.rate_limit.every == 0
            && processed < total
        {
            info!(
                pause_secs = config.rate_limit.pause.as_secs(),
                "pausing between target groups"
            );
            tokio::time::sleep(config.rate_limit.pause).await;
            summary.pauses += 1;
        }
    }

    summary
}
