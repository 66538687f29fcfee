//! Single-target collection: fetch, extract, persist.

use tracing::{debug, info, warn};

use crate::browser::{PageCapture, ProfileFetcher};
use crate::config::CollectorConfig;
use crate::error::{CollectError, CollectResult};
use crate::extract;
use crate::storage::{SnapshotStore, StoredSnapshot};

/// Collect one target and persist the resulting snapshot.
pub async fn collect_one(
    fetcher: &dyn ProfileFetcher,
    store: &dyn SnapshotStore,
    config: &CollectorConfig,
    username: &str,
) -> CollectResult<StoredSnapshot> {
    let capture = fetch_with_retry(fetcher, config, username).await?;
    let profile = extract::extract(username, &capture)?;
    debug!(
        username = %profile.username,
        source = ?profile.source,
        "profile extracted"
    );
    let stored = store.persist(&profile).await?;
    info!(username = %stored.username, id = stored.id, "snapshot persisted");
    Ok(stored)
}

/// Only navigation failures are retried; extraction and storage errors
/// describe the page or the backend, not the trip, so retrying the fetch
/// cannot fix them.
async fn fetch_with_retry(
    fetcher: &dyn ProfileFetcher,
    config: &CollectorConfig,
    username: &str,
) -> CollectResult<PageCapture> {
    let mut attempt: u32 = 0;
    loop {
        match fetcher.fetch(username).await {
            Ok(capture) => return Ok(capture),
            Err(err @ CollectError::Navigation { .. })
                if attempt < config.retry.max_retries =>
            {
                let delay = config.retry.backoff_delay(attempt);
                warn!(
                    target = username,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "navigation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use crate::config::{BackendChoice, RetryPolicy};
    use crate::error::ErrorKind;
    use crate::storage::sqlite::SqliteStore;

    /// Fails with a navigation error until `succeed_after` calls have been
    /// made, then serves the given capture.
    struct FlakyFetcher {
        calls: AtomicU32,
        succeed_after: u32,
        capture: PageCapture,
    }

    #[async_trait]
    impl ProfileFetcher for FlakyFetcher {
        async fn fetch(&self, username: &str) -> CollectResult<PageCapture> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.succeed_after {
                return Err(CollectError::Navigation {
                    url: format!("https://onlyfans.com/{username}"),
                    reason: "connection reset".to_string(),
                });
            }
            Ok(self.capture.clone())
        }

        async fn shutdown(self: Box<Self>) -> CollectResult<()> {
            Ok(())
        }
    }

    fn test_config(db_path: &std::path::Path) -> CollectorConfig {
        CollectorConfig::new(BackendChoice::Sqlite {
            db_path: db_path.to_path_buf(),
        })
    }

    fn alice_capture() -> PageCapture {
        PageCapture {
            payload: Some(serde_json::json!({"username": "alice", "postsCount": 3})),
            html: String::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn default_policy_does_not_retry() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir.path().join("t.db"));
        let fetcher = FlakyFetcher {
            calls: AtomicU32::new(0),
            succeed_after: 1,
            capture: alice_capture(),
        };

        let err = fetch_with_retry(&fetcher, &config, "alice").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Navigation);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_recover_transient_navigation_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(&dir.path().join("t.db"));
        config.retry = RetryPolicy {
            max_retries: 3,
            backoff_base_ms: 500,
        };
        let fetcher = FlakyFetcher {
            calls: AtomicU32::new(0),
            succeed_after: 2,
            capture: alice_capture(),
        };

        let capture = fetch_with_retry(&fetcher, &config, "alice").await.unwrap();
        assert!(capture.payload.is_some());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn extraction_errors_are_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("t.db");
        let mut config = test_config(&db_path);
        config.retry.max_retries = 3;

        // Fetch succeeds but the capture holds nothing extractable.
        let fetcher = FlakyFetcher {
            calls: AtomicU32::new(0),
            succeed_after: 0,
            capture: PageCapture::default(),
        };
        let store = SqliteStore::open(&db_path).unwrap();

        let err = collect_one(&fetcher, &store, &config, "alice")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Extraction);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn collect_one_persists_extracted_profile() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("t.db");
        let config = test_config(&db_path);
        let fetcher = FlakyFetcher {
            calls: AtomicU32::new(0),
            succeed_after: 0,
            capture: alice_capture(),
        };
        let store = SqliteStore::open(&db_path).unwrap();

        let stored = collect_one(&fetcher, &store, &config, "alice")
            .await
            .unwrap();
        assert_eq!(stored.username, "alice");
        assert_eq!(store.count_for("alice").unwrap(), 1);
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy {
            max_retries: 3,
            backoff_base_ms: 500,
        };
        assert_eq!(policy.backoff_delay(0).as_millis(), 500);
        assert_eq!(policy.backoff_delay(1).as_millis(), 1000);
        assert_eq!(policy.backoff_delay(2).as_millis(), 2000);
    }
}
