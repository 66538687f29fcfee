//! Error taxonomy for the collection pipeline.
//!
//! Per-target failures (`Navigation`, `Extraction`, `Storage`) are recovered
//! by the batch runner, which records them and moves on. `Configuration`
//! errors are fatal and abort before any target is processed.

use thiserror::Error;

/// Convenience result type.
pub type CollectResult<T> = Result<T, CollectError>;

/// Errors produced while collecting a profile snapshot.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The browser failed to load the target page.
    #[error("navigation failed for {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// Neither interception nor DOM fallback yielded a usable profile.
    #[error("extraction failed for {target}: {reason}")]
    Extraction { target: String, reason: String },

    /// The storage backend rejected the snapshot.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Invalid credentials, target list, or environment. Fatal.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Errors surfaced by a snapshot store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote store rejected credentials (status {status})")]
    Auth { status: u16 },

    #[error("remote store rejected insert (status {status}): {body}")]
    Remote { status: u16, body: String },

    #[error("failed to serialize profile: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("database mutex poisoned")]
    Poisoned,
}

/// Coarse failure category used in run summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Navigation,
    Extraction,
    Storage,
    Configuration,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::Navigation => "navigation",
            ErrorKind::Extraction => "extraction",
            ErrorKind::Storage => "storage",
            ErrorKind::Configuration => "configuration",
        };
        f.write_str(label)
    }
}

impl CollectError {
    /// Category of this error for summary reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CollectError::Navigation { .. } => ErrorKind::Navigation,
            CollectError::Extraction { .. } => ErrorKind::Extraction,
            CollectError::Storage(_) => ErrorKind::Storage,
            CollectError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Whether this error must abort the run instead of being recorded.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CollectError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_variants() {
        let nav = CollectError::Navigation {
            url: "https://onlyfans.com/alice".into(),
            reason: "timed out".into(),
        };
        assert_eq!(nav.kind(), ErrorKind::Navigation);
        assert!(!nav.is_fatal());

        let cfg = CollectError::Configuration("SUPA_BASE_ID missing".into());
        assert_eq!(cfg.kind(), ErrorKind::Configuration);
        assert!(cfg.is_fatal());
    }

    #[test]
    fn storage_errors_wrap_into_collect() {
        let err: CollectError = StorageError::Auth { status: 401 }.into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn kind_labels_are_lowercase() {
        assert_eq!(ErrorKind::Extraction.to_string(), "extraction");
        assert_eq!(ErrorKind::Storage.to_string(), "storage");
    }
}
