//! Embedded snapshot store backed by SQLite.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;

use super::{SnapshotStore, StoredSnapshot};
use crate::error::StorageError;
use crate::profile::Profile;

/// File-backed store. Creates the snapshots table and its indexes on open.
///
/// Calls are short synchronous statements, so one connection behind a mutex
/// is enough; the batch runner only ever appends from a single pipeline.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS onlyfans_profiles_snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                profile_data TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_snapshots_username
                ON onlyfans_profiles_snapshots(username);
            CREATE INDEX IF NOT EXISTS idx_snapshots_created_at
                ON onlyfans_profiles_snapshots(created_at);",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Number of snapshot rows stored for `username`.
    pub fn count_for(&self, username: &str) -> Result<u64, StorageError> {
        let conn = self.conn()?;
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM onlyfans_profiles_snapshots WHERE username = ?1",
            rusqlite::params![username],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// The most recently captured `profile_data` document for `username`.
    pub fn latest_profile_data(&self, username: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn()?;
        let result = conn.query_row(
            "SELECT profile_data FROM onlyfans_profiles_snapshots
             WHERE username = ?1 ORDER BY id DESC LIMIT 1",
            rusqlite::params![username],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(data) => Ok(Some(data)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SnapshotStore for SqliteStore {
    async fn persist(&self, profile: &Profile) -> Result<StoredSnapshot, StorageError> {
        let profile_data = serde_json::to_string(profile)?;
        // Process-clock capture timestamp, nanosecond precision so rapid
        // re-collections of one username still sort distinctly.
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO onlyfans_profiles_snapshots (username, profile_data, created_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![profile.username, profile_data, created_at],
        )?;
        let id = conn.last_insert_rowid();

        Ok(StoredSnapshot {
            id,
            username: profile.username.clone(),
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileSource;

    fn sample_profile(username: &str) -> Profile {
        let mut profile = Profile::new(username, ProfileSource::Api);
        profile.name = Some("Sample".into());
        profile.posts_count = Some(12);
        profile
    }

    #[tokio::test]
    async fn persist_appends_rows_without_dedup() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("snapshots.db")).unwrap();

        let first = store.persist(&sample_profile("alice")).await.unwrap();
        let second = store.persist(&sample_profile("alice")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_ne!(first.created_at, second.created_at);
        assert_eq!(store.count_for("alice").unwrap(), 2);
    }

    #[tokio::test]
    async fn reopen_is_idempotent_and_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshots.db");

        let store = SqliteStore::open(&path).unwrap();
        store.persist(&sample_profile("alice")).await.unwrap();
        drop(store);

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.count_for("alice").unwrap(), 1);
    }

    #[tokio::test]
    async fn latest_profile_data_round_trips_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("snapshots.db")).unwrap();

        assert!(store.latest_profile_data("alice").unwrap().is_none());

        store.persist(&sample_profile("alice")).await.unwrap();
        let data = store.latest_profile_data("alice").unwrap().unwrap();
        let stored: Profile = serde_json::from_str(&data).unwrap();
        assert_eq!(stored.username, "alice");
        assert_eq!(stored.posts_count, Some(12));
    }
}
