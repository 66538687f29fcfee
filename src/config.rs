//! Run configuration.
//!
//! All knobs the pipeline honors live here, built once at process start and
//! passed down by reference. Environment lookups (`SUPA_BASE_ID`,
//! `SUPA_BASE_PWD`, optional `SUPA_BASE_URL`, with `.env` honored) happen
//! only in [`SupabaseCredentials::from_env`]; nothing in the pipeline reads
//! ambient state.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CollectError, CollectResult};

/// Default embedded database file, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "onlyfans_profiles.db";

/// Base URL profile pages hang off of.
pub const PROFILE_URL_BASE: &str = "https://onlyfans.com";

/// Which snapshot store a run persists to. Selected once per run.
#[derive(Debug, Clone)]
pub enum BackendChoice {
    /// Local file-backed SQLite store.
    Sqlite { db_path: PathBuf },
    /// Remote Supabase table reached over PostgREST.
    Supabase(SupabaseCredentials),
}

/// Credentials and endpoint for the managed store.
#[derive(Debug, Clone)]
pub struct SupabaseCredentials {
    /// Supabase project ref, e.g. `abcdefghijklm`.
    pub project_id: String,
    /// Service secret sent as the PostgREST key.
    pub service_key: String,
    /// Endpoint override for self-hosted deployments and tests. When unset,
    /// the endpoint is derived from the project id.
    pub endpoint: Option<String>,
}

impl SupabaseCredentials {
    /// Build credentials from the process environment, honoring a `.env`
    /// file in the working directory.
    pub fn from_env() -> CollectResult<Self> {
        dotenvy::dotenv().ok();

        let project_id = std::env::var("SUPA_BASE_ID").map_err(|_| {
            CollectError::Configuration(
                "SUPA_BASE_ID must be set for the supabase backend".into(),
            )
        })?;
        let service_key = std::env::var("SUPA_BASE_PWD").map_err(|_| {
            CollectError::Configuration(
                "SUPA_BASE_PWD must be set for the supabase backend".into(),
            )
        })?;
        let endpoint = std::env::var("SUPA_BASE_URL").ok();

        Ok(Self {
            project_id,
            service_key,
            endpoint,
        })
    }

    /// PostgREST base the store posts to, without a trailing slash.
    pub fn rest_endpoint(&self) -> String {
        match &self.endpoint {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.supabase.co/rest/v1", self.project_id),
        }
    }
}

/// Navigation retry policy. Applies to navigation-stage failures only.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first. Default zero: one attempt total.
    pub max_retries: u32,
    /// Base delay; attempt `n` sleeps `base * 2^n` before retrying.
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    /// Delay before retry number `attempt`, counted from zero.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 500,
        }
    }
}

/// Pacing between groups of targets in batch mode.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    /// Pause after this many processed targets, success and failure alike.
    pub every: usize,
    /// How long to pause. The pause is skipped when no targets remain.
    pub pause: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            every: 10,
            pause: Duration::from_secs(5),
        }
    }
}

/// Everything a collection run needs to know.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub backend: BackendChoice,
    /// Substitute canned fixtures for the live browser.
    pub use_mock: bool,
    pub profile_url_base: String,
    /// Bound on a single page load.
    pub navigation_timeout: Duration,
    /// Window the interceptor waits for a matching API response.
    pub capture_timeout: Duration,
    pub retry: RetryPolicy,
    pub rate_limit: RateLimitPolicy,
}

impl CollectorConfig {
    /// A config with the documented defaults for the given backend.
    pub fn new(backend: BackendChoice) -> Self {
        Self {
            backend,
            use_mock: false,
            profile_url_base: PROFILE_URL_BASE.to_string(),
            navigation_timeout: Duration::from_secs(10),
            capture_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            rate_limit: RateLimitPolicy::default(),
        }
    }
}
