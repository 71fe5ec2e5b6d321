// src/options.rs
// =============================================================================
// Crawl options as callers pass them, and their normalized form.
//
// Every field of CrawlOptions is optional. normalize() fills in defaults and
// clamps out-of-range values so the rest of the crawler never re-checks them.
// =============================================================================

use crate::acquire::CancelSignal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
pub const MIN_TIMEOUT_MS: u64 = 100;

/// How directory markup is acquired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Primary HTTP fetch only
    Fetch,
    /// Host-provided alternate channel only
    Alternate,
    /// Fetch first, alternate channel when the fetch fails
    #[default]
    Auto,
}

/// Options as supplied by a caller. Missing fields take defaults.
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    pub max_depth: Option<i64>,
    pub mode: Option<Mode>,
    pub include_metadata: Option<bool>,
    pub enrichment_concurrency: Option<i64>,
    pub timeout_ms: Option<i64>,
    pub same_origin_only: Option<bool>,
    pub cancel: Option<CancelSignal>,
}

/// Options after defaulting and clamping.
#[derive(Debug, Clone)]
pub struct NormalizedOptions {
    pub max_depth: usize,
    pub mode: Mode,
    pub include_metadata: bool,
    pub enrichment_concurrency: usize,
    pub timeout: Duration,
    pub same_origin_only: bool,
    pub cancel: Option<CancelSignal>,
}

impl CrawlOptions {
    pub fn normalize(&self) -> NormalizedOptions {
        let max_depth = self.max_depth.unwrap_or(0).max(0) as usize;
        let concurrency = self
            .enrichment_concurrency
            .unwrap_or(DEFAULT_CONCURRENCY as i64)
            .max(1) as usize;
        let timeout_ms = self
            .timeout_ms
            .unwrap_or(DEFAULT_TIMEOUT_MS as i64)
            .max(MIN_TIMEOUT_MS as i64) as u64;

        NormalizedOptions {
            max_depth,
            mode: self.mode.unwrap_or_default(),
            include_metadata: self.include_metadata.unwrap_or(false),
            enrichment_concurrency: concurrency,
            timeout: Duration::from_millis(timeout_ms),
            same_origin_only: self.same_origin_only.unwrap_or(true),
            cancel: self.cancel.clone(),
        }
    }
}
