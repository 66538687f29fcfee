//! Network interception primitives.
//!
//! The CDP listener and the capture wait run as two cooperating tasks joined
//! by a single-slot channel: every matching response body overwrites the
//! slot, and [`CaptureSlot::wait`] resolves to whatever was written last. A
//! navigation can trigger several profile API calls and the most recent one
//! is authoritative.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;

/// How long the slot keeps accepting overwrites after the first match.
pub const SETTLE_WINDOW: Duration = Duration::from_millis(500);

/// Matching rules for the platform's profile API responses.
#[derive(Debug, Clone)]
pub struct CaptureFilter {
    url_fragment: String,
}

impl CaptureFilter {
    /// Filter for one target's profile endpoint.
    pub fn for_target(username: &str) -> Self {
        Self {
            url_fragment: format!("/api2/v2/users/{username}"),
        }
    }

    /// URL pattern, JSON content type, HTTP 200.
    pub fn matches(&self, url: &str, mime_type: &str, status: i64) -> bool {
        status == 200 && mime_type.contains("json") && url.contains(&self.url_fragment)
    }
}

/// Writer half: the CDP listener offers every matching payload it sees.
pub struct CaptureSink {
    tx: watch::Sender<Option<Value>>,
}

impl CaptureSink {
    /// Overwrite the slot with a newer payload. Never blocks.
    pub fn offer(&self, payload: Value) {
        let _ = self.tx.send(Some(payload));
    }
}

/// Reader half: resolves once to the last payload of the capture window.
pub struct CaptureSlot {
    rx: watch::Receiver<Option<Value>>,
}

impl CaptureSlot {
    /// Wait up to `timeout` for a first match, then keep draining overwrites
    /// until `settle` passes without a newer one. `None` means nothing
    /// matched; the caller falls back to DOM extraction.
    pub async fn wait(mut self, timeout: Duration, settle: Duration) -> Option<Value> {
        match tokio::time::timeout(timeout, self.rx.changed()).await {
            Ok(Ok(())) => {}
            // Timeout, or the sink is gone: return whatever arrived so far.
            _ => return self.rx.borrow().clone(),
        }

        loop {
            match tokio::time::timeout(settle, self.rx.changed()).await {
                Ok(Ok(())) => continue,
                _ => break,
            }
        }

        self.rx.borrow().clone()
    }
}

/// A fresh single-slot capture channel for one navigation.
pub fn channel() -> (CaptureSink, CaptureSlot) {
    let (tx, rx) = watch::channel(None);
    (CaptureSink { tx }, CaptureSlot { rx })
}
