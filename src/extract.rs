//! Profile extraction.
//!
//! Ordered by trust: a strictly decoded intercepted payload is
//! authoritative; otherwise the rendered page is inspected, first for
//! embedded JSON state and then for visible elements. Whatever the path,
//! the username comes from the observed data, never echoed back from
//! the requested target, so a page that shows nothing yields a hard
//! [`CollectError::Extraction`] instead of a fabricated record.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::browser::PageCapture;
use crate::error::{CollectError, CollectResult};
use crate::profile::{ApiProfile, Profile, ProfileSource};

/// JavaScript state variables single-page apps leave in the page source.
const STATE_PATTERNS: &[&str] = &[
    r"window\.__INITIAL_STATE__\s*=\s*(\{.+?\});",
    r"window\.__NUXT__\s*=\s*(\{.+?\});",
    r"window\.__APP_STATE__\s*=\s*(\{.+?\});",
];

const USERNAME_SELECTORS: &[&str] = &[
    r#"[data-testid="profile-username"]"#,
    ".g-user-username",
    ".profile-username",
];

const NAME_SELECTORS: &[&str] = &[
    "h1",
    "h2",
    "h3",
    ".profile-name",
    r#"[data-testid="profile-name"]"#,
    ".m-username",
    ".profile-title",
    ".user-name",
];

const AVATAR_SELECTORS: &[&str] = &[
    r#"img[src*="avatar"]"#,
    r#"img[alt*="avatar"]"#,
    ".profile-avatar img",
    ".avatar img",
    r#"[data-testid="profile-avatar"] img"#,
    ".m-avatar img",
    ".user-avatar img",
    r#"img[src*="profile"]"#,
];

const VERIFIED_SELECTORS: &[&str] = &[
    ".verified-badge",
    ".m-verified",
    r#"[data-testid="verified-badge"]"#,
    ".icon-verified",
    ".verified",
    r#"svg[aria-label*="verified"]"#,
    r#"svg[aria-label*="Verified"]"#,
    r#"[title*="verified"]"#,
    r#"[title*="Verified"]"#,
];

const ABOUT_SELECTORS: &[&str] = &[
    r#"[data-testid="profile-about"]"#,
    ".profile-about",
    ".about",
];

/// Normalize one navigation's capture into a [`Profile`].
pub fn extract(target: &str, capture: &PageCapture) -> CollectResult<Profile> {
    if let Some(payload) = &capture.payload {
        if let Some(profile) = decode_api_record(target, payload, ProfileSource::Api) {
            return Ok(profile);
        }
        debug!(
            target,
            "intercepted payload did not decode as profile data; falling back to DOM"
        );
    }

    extract_from_dom(target, &capture.html)
}

/// Strict decode of an API-shaped record. `None` on schema mismatch, a
/// username that is not the target's, or an invalid field value.
fn decode_api_record(target: &str, payload: &Value, source: ProfileSource) -> Option<Profile> {
    let api: ApiProfile = serde_json::from_value(payload.clone()).ok()?;
    if !api.username.eq_ignore_ascii_case(target) {
        return None;
    }
    let profile = api.into_profile(source);
    profile.validate().ok()?;
    Some(profile)
}

fn extract_from_dom(target: &str, html: &str) -> CollectResult<Profile> {
    if let Some(profile) = extract_from_embedded_state(target, html) {
        debug!(target, "recovered profile from embedded page state");
        return Ok(profile);
    }

    let doc = Html::parse_document(html);
    let username = dom_username(&doc).ok_or_else(|| CollectError::Extraction {
        target: target.to_string(),
        reason: "no resolvable username in intercepted traffic or rendered page".into(),
    })?;

    // A heading that just repeats the handle is not a display name.
    let name = first_text(&doc, NAME_SELECTORS).filter(|text| *text != username);

    let mut profile = Profile::new(username, ProfileSource::Dom);
    profile.name = name;
    profile.avatar = first_attr(&doc, AVATAR_SELECTORS, "src");
    if selects_any(&doc, VERIFIED_SELECTORS) {
        profile.is_verified = Some(true);
    }
    profile.about = first_text(&doc, ABOUT_SELECTORS);

    Ok(profile)
}

/// Scan the page source for app state blobs containing the target's user
/// record; the record goes through the same strict decode as an intercepted
/// payload.
fn extract_from_embedded_state(target: &str, html: &str) -> Option<Profile> {
    for pattern in STATE_PATTERNS {
        let re = Regex::new(&format!("(?s){pattern}")).expect("state regex is valid");
        for caps in re.captures_iter(html) {
            let Some(blob) = caps.get(1) else { continue };
            let Ok(value) = serde_json::from_str::<Value>(blob.as_str()) else {
                continue;
            };
            if let Some(record) = find_user_record(&value, target) {
                if let Some(profile) = decode_api_record(target, &record, ProfileSource::Dom) {
                    return Some(profile);
                }
            }
        }
    }

    // Flat user objects embedded outside a recognized state variable.
    let loose = format!(
        r#"\{{[^{{}}]*"username"\s*:\s*"{}"[^{{}}]*\}}"#,
        regex::escape(target)
    );
    let re = Regex::new(&loose).expect("loose user regex is valid");
    for m in re.find_iter(html) {
        let Ok(value) = serde_json::from_str::<Value>(m.as_str()) else {
            continue;
        };
        if let Some(profile) = decode_api_record(target, &value, ProfileSource::Dom) {
            return Some(profile);
        }
    }

    None
}

/// Depth-first search for an object whose `username` is the target's.
fn find_user_record(value: &Value, target: &str) -> Option<Value> {
    match value {
        Value::Object(map) => {
            let matches_target = map
                .get("username")
                .and_then(Value::as_str)
                .is_some_and(|u| u.eq_ignore_ascii_case(target));
            if matches_target {
                return Some(value.clone());
            }
            map.values().find_map(|v| find_user_record(v, target))
        }
        Value::Array(items) => items.iter().find_map(|v| find_user_record(v, target)),
        _ => None,
    }
}

/// The handle the page itself claims: canonical profile URL first, then
/// visible handle elements.
fn dom_username(doc: &Html) -> Option<String> {
    let og_url = Selector::parse(r#"meta[property="og:url"]"#).expect("og:url selector is valid");
    if let Some(el) = doc.select(&og_url).next() {
        if let Some(content) = el.value().attr("content") {
            if let Ok(parsed) = Url::parse(content) {
                if let Some(handle) = parsed
                    .path_segments()
                    .and_then(|mut segments| segments.find(|s| !s.is_empty()))
                {
                    return Some(handle.to_string());
                }
            }
        }
    }

    for sel in USERNAME_SELECTORS {
        if let Ok(selector) = Selector::parse(sel) {
            if let Some(el) = doc.select(&selector).next() {
                let handle = el
                    .text()
                    .collect::<String>()
                    .trim()
                    .trim_start_matches('@')
                    .to_string();
                if !handle.is_empty() {
                    return Some(handle);
                }
            }
        }
    }

    None
}

fn first_text(doc: &Html, selectors: &[&str]) -> Option<String> {
    for sel in selectors {
        if let Ok(selector) = Selector::parse(sel) {
            if let Some(el) = doc.select(&selector).next() {
                let text = el.text().collect::<String>().trim().to_string();
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

fn first_attr(doc: &Html, selectors: &[&str], attr: &str) -> Option<String> {
    for sel in selectors {
        if let Ok(selector) = Selector::parse(sel) {
            if let Some(value) = doc
                .select(&selector)
                .next()
                .and_then(|el| el.value().attr(attr))
            {
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

fn selects_any(doc: &Html, selectors: &[&str]) -> bool {
    selectors.iter().any(|sel| {
        Selector::parse(sel)
            .map(|selector| doc.select(&selector).next().is_some())
            .unwrap_or(false)
    })
}
