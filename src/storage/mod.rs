//! Snapshot persistence.
//!
//! Both backends expose the same append-only contract: [`SnapshotStore::persist`]
//! inserts one immutable row per call. No upsert, no dedup: collecting the
//! same username twice is two rows of history. The backend is chosen once per
//! run from [`BackendChoice`].

pub mod sqlite;
pub mod supabase;

use async_trait::async_trait;

use crate::config::BackendChoice;
use crate::error::{CollectResult, StorageError};
use crate::profile::Profile;

pub use sqlite::SqliteStore;
pub use supabase::SupabaseStore;

/// The snapshots table, identical logical schema on both backends.
pub const SNAPSHOTS_TABLE: &str = "onlyfans_profiles_snapshots";

/// A persisted snapshot row as the backend reported it.
#[derive(Debug, Clone)]
pub struct StoredSnapshot {
    /// Storage-assigned surrogate key.
    pub id: i64,
    pub username: String,
    /// Capture timestamp, RFC 3339.
    pub created_at: String,
}

/// Append-only snapshot persistence.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Insert one snapshot row and return it as stored.
    async fn persist(&self, profile: &Profile) -> Result<StoredSnapshot, StorageError>;
}

/// Open the store a run was configured with.
pub async fn open_store(backend: &BackendChoice) -> CollectResult<Box<dyn SnapshotStore>> {
    match backend {
        BackendChoice::Sqlite { db_path } => Ok(Box::new(SqliteStore::open(db_path)?)),
        BackendChoice::Supabase(creds) => Ok(Box::new(SupabaseStore::new(creds)?)),
    }
}
