//! Canned-capture fetcher for tests and offline runs.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{PageCapture, ProfileFetcher};
use crate::config::PROFILE_URL_BASE;
use crate::error::{CollectError, CollectResult};

/// Replays pre-registered captures keyed by lowercased username. Unknown
/// targets fail the same way an unreachable page does.
#[derive(Debug, Default)]
pub struct MockCollector {
    captures: HashMap<String, PageCapture>,
}

impl MockCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raw capture for a target.
    pub fn with_capture(mut self, username: &str, capture: PageCapture) -> Self {
        self.captures.insert(username.to_lowercase(), capture);
        self
    }

    /// Register an intercepted-payload capture with a minimal page shell.
    pub fn with_payload(mut self, username: &str, payload: Value) -> Self {
        let html = format!(
            r#"<html><head><meta property="og:url" content="{PROFILE_URL_BASE}/{username}"></head><body></body></html>"#
        );
        self.with_capture(
            username,
            PageCapture {
                payload: Some(payload),
                html,
            },
        )
    }

    /// A collector pre-loaded with two well-known profiles.
    pub fn sample() -> Self {
        Self::new()
            .with_payload(
                "iggyazalea",
                json!({
                    "username": "iggyazalea",
                    "name": "Iggy Azalea",
                    "avatar": "https://public.onlyfans.com/files/iggyazalea/avatar.jpg",
                    "header": "https://public.onlyfans.com/files/iggyazalea/header.jpg",
                    "about": "Grammy nominated artist.",
                    "isVerified": true,
                    "postsCount": 189,
                    "photosCount": 322,
                    "videosCount": 41,
                    "favoritedCount": 1250000,
                    "subscribePrice": 25.0,
                    "joinDate": "2023-01-13T00:00:00+00:00",
                    "lastSeen": "2024-01-05T12:00:00+00:00",
                    "tipsEnabled": true
                }),
            )
            .with_payload(
                "testuser",
                json!({
                    "username": "testuser",
                    "name": "Test User",
                    "isVerified": false,
                    "postsCount": 12,
                    "photosCount": 30,
                    "videosCount": 2,
                    "subscribePrice": 0.0,
                    "tipsEnabled": false
                }),
            )
    }
}

#[async_trait]
impl ProfileFetcher for MockCollector {
    async fn fetch(&self, username: &str) -> CollectResult<PageCapture> {
        debug!(target = username, "serving mock capture");
        self.captures
            .get(&username.to_lowercase())
            .cloned()
            .ok_or_else(|| CollectError::Navigation {
                url: format!("{PROFILE_URL_BASE}/{username}"),
                reason: "no canned capture for target".to_string(),
            })
    }

    async fn shutdown(self: Box<Self>) -> CollectResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn sample_serves_known_profiles_case_insensitively() {
        let mock = MockCollector::sample();
        let capture = mock.fetch("IggyAzalea").await.unwrap();
        let payload = capture.payload.unwrap();
        assert_eq!(payload["username"], "iggyazalea");
        assert_eq!(payload["postsCount"], 189);
    }

    #[tokio::test]
    async fn unknown_target_is_navigation_error() {
        let mock = MockCollector::sample();
        let err = mock.fetch("nobody").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Navigation);
    }
}
