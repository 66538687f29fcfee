//! Headless Chromium driver.
//!
//! One browser process serves a whole run; each [`fetch`] opens a fresh tab,
//! attaches a CDP network listener for the profile API, navigates, waits for
//! the capture to settle, and serializes the rendered page.
//!
//! [`fetch`]: ChromiumCollector::fetch

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EventResponseReceived, GetResponseBodyParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{PageCapture, ProfileFetcher};
use crate::config::CollectorConfig;
use crate::error::{CollectError, CollectResult};
use crate::intercept::{self, CaptureFilter};

/// Desktop user agent; the platform serves a reduced page to obvious bots.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

const BINARY_CANDIDATES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

const FALLBACK_PATHS: &[&str] = &[
    "/snap/bin/chromium",
    "/usr/bin/chromium-browser",
    "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
];

/// Locate a Chromium binary: env override, then PATH, then known installs.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. OFINDEX_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("OFINDEX_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. System PATH
    for name in BINARY_CANDIDATES {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 3. Snap, flatpak, and other common install locations
    FALLBACK_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn profile_url(base: &str, username: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), username)
}

/// Real browser-backed fetcher.
pub struct ChromiumCollector {
    browser: Browser,
    handler_task: JoinHandle<()>,
    base_url: String,
    navigation_timeout: Duration,
    capture_timeout: Duration,
}

impl ChromiumCollector {
    /// Launch a headless browser. Fails with a fatal configuration error
    /// when no binary can be found or the process does not come up.
    pub async fn launch(config: &CollectorConfig) -> CollectResult<Self> {
        let executable = find_chromium().ok_or_else(|| {
            CollectError::Configuration(
                "no Chromium binary found; install chromium or set OFINDEX_CHROMIUM_PATH"
                    .to_string(),
            )
        })?;
        info!(executable = %executable.display(), "launching headless Chromium");

        let browser_config = BrowserConfig::builder()
            .chrome_executable(executable)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={USER_AGENT}"))
            .window_size(1920, 1080)
            .build()
            .map_err(|e| {
                CollectError::Configuration(format!("invalid browser configuration: {e}"))
            })?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| CollectError::Configuration(format!("failed to launch Chromium: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            base_url: config.profile_url_base.clone(),
            navigation_timeout: config.navigation_timeout,
            capture_timeout: config.capture_timeout,
        })
    }

    async fn drive(&self, page: &Page, username: &str, url: &str) -> CollectResult<PageCapture> {
        let filter = CaptureFilter::for_target(username);
        let (sink, slot) = intercept::channel();

        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| CollectError::Navigation {
                url: url.to_string(),
                reason: format!("failed to attach network listener: {e}"),
            })?;

        let interceptor = {
            let page = page.clone();
            tokio::spawn(async move {
                while let Some(event) = responses.next().await {
                    if !filter.matches(
                        &event.response.url,
                        &event.response.mime_type,
                        event.response.status,
                    ) {
                        continue;
                    }
                    debug!(url = %event.response.url, "profile API response matched");
                    match page
                        .execute(GetResponseBodyParams::new(event.request_id.clone()))
                        .await
                    {
                        Ok(body) => {
                            let Some(raw) = decode_body(&body.body, body.base64_encoded) else {
                                continue;
                            };
                            match serde_json::from_str::<Value>(&raw) {
                                Ok(value) => sink.offer(value),
                                Err(e) => {
                                    debug!(error = %e, "matched response body is not JSON");
                                }
                            }
                        }
                        Err(e) => debug!(error = %e, "failed to fetch response body"),
                    }
                }
            })
        };

        debug!(%url, "navigating");
        match tokio::time::timeout(self.navigation_timeout, page.goto(url)).await {
            Ok(Ok(_)) => {
                if let Err(e) = page.wait_for_navigation().await {
                    debug!(error = %e, "wait_for_navigation returned early");
                }
            }
            Ok(Err(e)) => {
                interceptor.abort();
                return Err(CollectError::Navigation {
                    url: url.to_string(),
                    reason: format!("navigation failed: {e}"),
                });
            }
            Err(_) => {
                interceptor.abort();
                return Err(CollectError::Navigation {
                    url: url.to_string(),
                    reason: format!("timed out after {:?}", self.navigation_timeout),
                });
            }
        }

        let payload = slot.wait(self.capture_timeout, intercept::SETTLE_WINDOW).await;
        interceptor.abort();

        if payload.is_none() {
            debug!(target = username, "no profile API response captured");
        }

        let html = page
            .evaluate("document.documentElement.outerHTML")
            .await
            .ok()
            .and_then(|value| value.into_value::<String>().ok())
            .unwrap_or_default();

        Ok(PageCapture { payload, html })
    }
}

fn decode_body(body: &str, base64_encoded: bool) -> Option<String> {
    if !base64_encoded {
        return Some(body.to_string());
    }
    match general_purpose::STANDARD.decode(body.as_bytes()) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Some(text),
            Err(e) => {
                debug!(error = %e, "response body is not UTF-8");
                None
            }
        },
        Err(e) => {
            debug!(error = %e, "failed to base64-decode response body");
            None
        }
    }
}

#[async_trait]
impl ProfileFetcher for ChromiumCollector {
    async fn fetch(&self, username: &str) -> CollectResult<PageCapture> {
        let url = profile_url(&self.base_url, username);
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| CollectError::Navigation {
                url: url.clone(),
                reason: format!("failed to open page: {e}"),
            })?;

        let result = self.drive(&page, username, &url).await;

        if let Err(e) = page.close().await {
            warn!(error = %e, "failed to close page");
        }
        result
    }

    async fn shutdown(mut self: Box<Self>) -> CollectResult<()> {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "browser close failed");
        }
        self.handler_task.abort();
        Ok(())
    }
}

impl Drop for ChromiumCollector {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_url_joins_without_double_slash() {
        assert_eq!(
            profile_url("https://onlyfans.com", "alice"),
            "https://onlyfans.com/alice"
        );
        assert_eq!(
            profile_url("https://onlyfans.com/", "alice"),
            "https://onlyfans.com/alice"
        );
    }

    #[test]
    fn body_decoding_handles_both_encodings() {
        assert_eq!(
            decode_body("{\"a\":1}", false).as_deref(),
            Some("{\"a\":1}")
        );
        assert_eq!(
            decode_body("eyJhIjoxfQ==", true).as_deref(),
            Some("{\"a\":1}")
        );
        assert!(decode_body("not base64!!!", true).is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn launch_and_shutdown() {
        use crate::config::{BackendChoice, CollectorConfig};

        let config = CollectorConfig::new(BackendChoice::Sqlite {
            db_path: "unused.db".into(),
        });
        let collector = Box::new(ChromiumCollector::launch(&config).await.unwrap());
        collector.shutdown().await.unwrap();
    }
}
