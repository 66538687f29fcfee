// Copyright 2026 Ofindex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ofindex — browser-driven profile snapshot collector for the OnlyFans
//! Economic Index.
//!
//! The pipeline navigates a headless browser to a creator's public profile
//! page, intercepts the platform's own profile API response over the Chrome
//! DevTools Protocol, normalizes it into a [`profile::Profile`], and appends
//! a timestamped snapshot to either an embedded SQLite database or a managed
//! Supabase project. When no API response can be captured, a degraded
//! profile is recovered from the rendered page itself.

pub mod batch;
pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod intercept;
pub mod pipeline;
pub mod profile;
pub mod storage;
pub mod targets;
