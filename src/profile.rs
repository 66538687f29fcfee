//! Normalized profile records and the platform's wire schema.
//!
//! A [`Profile`] is one navigation's observable state, normalized. Every
//! attribute except the username is optional: absence is representable and
//! distinct from an observed zero. The [`ApiProfile`] mirror carries the
//! platform's camelCase field names and is decoded strictly: a payload that
//! does not fit the schema is rejected rather than partially absorbed.

use serde::{Deserialize, Serialize};

/// Which path produced a normalized profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileSource {
    /// Decoded from an intercepted profile API response.
    Api,
    /// Recovered from the rendered page (embedded state or visible elements).
    Dom,
}

/// One profile's normalized, point-in-time state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub name: Option<String>,
    pub is_verified: Option<bool>,
    pub avatar: Option<String>,
    pub header: Option<String>,
    pub about: Option<String>,
    pub posts_count: Option<u64>,
    pub photos_count: Option<u64>,
    pub videos_count: Option<u64>,
    pub subscribe_price: Option<f64>,
    pub join_date: Option<String>,
    pub last_seen: Option<String>,
    pub favorites_count: Option<u64>,
    pub favorited_count: Option<u64>,
    pub subscribers_count: Option<u64>,
    pub tips_enabled: Option<bool>,
    pub source: ProfileSource,
}

impl Profile {
    /// An empty profile for `username` with every attribute unobserved.
    pub fn new(username: impl Into<String>, source: ProfileSource) -> Self {
        Self {
            username: username.into(),
            name: None,
            is_verified: None,
            avatar: None,
            header: None,
            about: None,
            posts_count: None,
            photos_count: None,
            videos_count: None,
            subscribe_price: None,
            join_date: None,
            last_seen: None,
            favorites_count: None,
            favorited_count: None,
            subscribers_count: None,
            tips_enabled: None,
            source,
        }
    }

    /// Check the record invariants: non-empty username, non-negative price.
    ///
    /// Counts are non-negative by type; the price is the one numeric field
    /// that needs an explicit check.
    pub fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("username is empty".into());
        }
        if let Some(price) = self.subscribe_price {
            if price < 0.0 || !price.is_finite() {
                return Err(format!("subscribe_price {price} is not a valid amount"));
            }
        }
        Ok(())
    }
}

/// The profile API response shape, camelCase as sent over the wire.
///
/// Only the username is required; the platform omits fields freely depending
/// on viewer state. Unknown fields are ignored so payload growth does not
/// break the decode.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProfile {
    pub username: String,
    pub name: Option<String>,
    pub is_verified: Option<bool>,
    pub avatar: Option<String>,
    pub header: Option<String>,
    pub about: Option<String>,
    pub posts_count: Option<u64>,
    pub photos_count: Option<u64>,
    pub videos_count: Option<u64>,
    pub subscribe_price: Option<f64>,
    pub join_date: Option<String>,
    pub last_seen: Option<String>,
    pub favorites_count: Option<u64>,
    pub favorited_count: Option<u64>,
    pub subscribers_count: Option<u64>,
    pub tips_enabled: Option<bool>,
}

impl ApiProfile {
    /// Map wire fields onto a normalized [`Profile`] tagged with `source`.
    pub fn into_profile(self, source: ProfileSource) -> Profile {
        Profile {
            username: self.username,
            name: self.name,
            is_verified: self.is_verified,
            avatar: self.avatar,
            header: self.header,
            about: self.about,
            posts_count: self.posts_count,
            photos_count: self.photos_count,
            videos_count: self.videos_count,
            subscribe_price: self.subscribe_price,
            join_date: self.join_date,
            last_seen: self.last_seen,
            favorites_count: self.favorites_count,
            favorited_count: self.favorited_count,
            subscribers_count: self.subscribers_count,
            tips_enabled: self.tips_enabled,
            source,
        }
    }
}
