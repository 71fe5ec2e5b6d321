// src/crawl/mod.rs
// =============================================================================
// This module runs a whole crawl.
//
// Steps:
// 1. Normalize the options (defaults, clamping)
// 2. Walk the directory tree (traverse.rs), collecting into a
//    TraversalState (state.rs)
// 3. Optionally probe every file for mime/size (enrich.rs)
// 4. Assemble the CrawlResult: tree, flat lists, errors, stats
//
// The Crawler struct holds what outlives a single crawl: the HTTP client,
// the alternate channel (if the host has one) and the entry limit.
// =============================================================================

mod enrich;
mod state;
mod traverse;

pub use enrich::{apply_to_tree, enrich_files, EnrichReport};
pub use state::{TraversalState, ENTRY_LIMIT};
pub use traverse::Traversal;

use crate::acquire::{Acquirer, AlternateChannel, HttpFetcher};
use crate::error::CrawlError;
use crate::model::{CrawlResult, CrawlStats, Entry, FolderNode};
use crate::options::{CrawlOptions, Mode};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub struct Crawler {
    fetcher: HttpFetcher,
    alternate: Option<Arc<dyn AlternateChannel>>,
    entry_limit: u64,
}

impl Crawler {
    pub fn new() -> Result<Self, CrawlError> {
        Ok(Self::with_fetcher(HttpFetcher::new()?))
    }

    pub fn with_fetcher(fetcher: HttpFetcher) -> Self {
        Crawler {
            fetcher,
            alternate: None,
            entry_limit: ENTRY_LIMIT,
        }
    }

    /// Installs the channel used by the alternate strategy.
    pub fn with_alternate(mut self, channel: Arc<dyn AlternateChannel>) -> Self {
        self.alternate = Some(channel);
        self
    }

    pub fn with_entry_limit(mut self, limit: u64) -> Self {
        self.entry_limit = limit;
        self
    }

    /// Crawls the directory index at `url`.
    ///
    /// Fatal problems (bad URL, a directory no strategy could load, a missing
    /// alternate channel) come back as Err. Everything else ends up in
    /// `CrawlResult::errors`.
    pub async fn crawl(&self, url: &str, options: &CrawlOptions) -> Result<CrawlResult, CrawlError> {
        let options = options.normalize();
        let started = Instant::now();

        if options.mode == Mode::Alternate && self.alternate.is_none() {
            return Err(CrawlError::EnvironmentUnsupported {
                context: format!("alternate mode requested for {}", url),
            });
        }

        info!(url, mode = ?options.mode, max_depth = options.max_depth, "starting crawl");

        let mut state = TraversalState::new(self.entry_limit);
        let acquirer = Acquirer::new(&self.fetcher, self.alternate.as_deref(), &options);
        let mut root = Traversal::new(acquirer, &options, &mut state).run(url).await?;

        if options.include_metadata {
            let report = enrich_files(&self.fetcher, &mut state.files, &options).await;
            state.probes += report.probes;
            state.errors.extend(report.errors);
            apply_to_tree(&mut root, &state.files);
        }

        let result = assemble(root, state, started);
        info!(
            folders = result.folders.len(),
            files = result.files.len(),
            errors = result.errors.len(),
            duration_ms = result.stats.duration_ms,
            "crawl finished"
        );
        Ok(result)
    }
}

/// Crawls `url` with a default Crawler (no alternate channel).
pub async fn crawl(url: &str, options: &CrawlOptions) -> Result<CrawlResult, CrawlError> {
    Crawler::new()?.crawl(url, options).await
}

fn assemble(root: FolderNode, state: TraversalState, started: Instant) -> CrawlResult {
    let entries = state
        .folders
        .iter()
        .cloned()
        .map(Entry::Folder)
        .chain(state.files.iter().cloned().map(Entry::File))
        .collect();

    CrawlResult {
        url: root.folder.url.clone(),
        stats: CrawlStats {
            fetches: state.counters.fetches,
            alternates: state.counters.alternates,
            probes: state.probes,
            duration_ms: started.elapsed().as_millis() as u64,
            max_depth: state.max_depth_reached,
        },
        server: state.server,
        root,
        folders: state.folders,
        files: state.files,
        entries,
        generated_at: Utc::now(),
        errors: state.errors,
    }
}
