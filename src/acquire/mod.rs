// src/acquire/mod.rs
// =============================================================================
// Getting the markup of one directory page.
//
// There are two strategies:
// - Primary: an HTTP GET through reqwest (see http.rs)
// - Alternate: a caller-supplied channel (see alternate.rs)
//
// The crawl mode picks which strategies run and in what order:
//   fetch     -> [Primary]
//   alternate -> [Alternate]
//   auto      -> [Primary, Alternate]
// The first strategy that succeeds wins. When all of them fail, the caller
// gets every failure back in one CrawlError::Acquisition.
// =============================================================================

mod alternate;
mod cancel;
mod http;

pub use alternate::AlternateChannel;
pub use cancel::CancelSignal;
pub use http::{Fetched, HttpFetcher, ProbeResponse};

use crate::error::{AcquireFailure, CrawlError, Strategy};
use crate::listing::DirectoryUrl;
use crate::model::ServerKind;
use crate::options::{Mode, NormalizedOptions};
use cancel::run_guarded;
use std::time::Duration;
use tracing::{debug, warn};

/// Markup for one directory, and how it was obtained.
#[derive(Debug, Clone)]
pub struct Acquired {
    pub markup: String,
    pub strategy: Strategy,
    /// Only known when the primary fetch produced the page
    pub server: Option<ServerKind>,
}

/// Per-crawl counters of strategy attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquireCounters {
    /// Primary fetches that got a response
    pub fetches: u64,
    /// Alternate channel invocations
    pub alternates: u64,
}

pub fn strategies(mode: Mode) -> &'static [Strategy] {
    match mode {
        Mode::Fetch => &[Strategy::Primary],
        Mode::Alternate => &[Strategy::Alternate],
        Mode::Auto => &[Strategy::Primary, Strategy::Alternate],
    }
}

/// Runs the strategy list of one crawl against directory URLs.
pub struct Acquirer<'a> {
    fetcher: &'a HttpFetcher,
    alternate: Option<&'a dyn AlternateChannel>,
    mode: Mode,
    timeout: Duration,
    cancel: Option<&'a CancelSignal>,
}

impl<'a> Acquirer<'a> {
    pub fn new(
        fetcher: &'a HttpFetcher,
        alternate: Option<&'a dyn AlternateChannel>,
        options: &'a NormalizedOptions,
    ) -> Self {
        Acquirer {
            fetcher,
            alternate,
            mode: options.mode,
            timeout: options.timeout,
            cancel: options.cancel.as_ref(),
        }
    }

    pub async fn acquire(
        &self,
        url: &DirectoryUrl,
        counters: &mut AcquireCounters,
    ) -> Result<Acquired, CrawlError> {
        let mut attempts = Vec::new();

        for &strategy in strategies(self.mode) {
            match self.attempt(strategy, url, counters).await {
                Ok(acquired) => {
                    debug!(url = %url, %strategy, bytes = acquired.markup.len(), "acquired directory");
                    return Ok(acquired);
                }
                Err(failure) => {
                    warn!(url = %url, %strategy, %failure, "acquisition strategy failed");
                    attempts.push((strategy, failure));
                }
            }
        }

        // Running out of strategies because the environment has no alternate
        // channel is reported separately from ordinary failures.
        if let Some((Strategy::Alternate, AcquireFailure::Unsupported)) = attempts.last() {
            let earlier = attempts[..attempts.len() - 1]
                .iter()
                .map(|(strategy, failure)| format!("{}: {}", strategy, failure))
                .collect::<Vec<_>>();
            let context = if earlier.is_empty() {
                format!("needed for {}", url)
            } else {
                format!("needed for {} after {}", url, earlier.join("; "))
            };
            return Err(CrawlError::EnvironmentUnsupported { context });
        }

        Err(CrawlError::Acquisition {
            url: url.to_string(),
            attempts,
        })
    }

    async fn attempt(
        &self,
        strategy: Strategy,
        url: &DirectoryUrl,
        counters: &mut AcquireCounters,
    ) -> Result<Acquired, AcquireFailure> {
        match strategy {
            Strategy::Primary => {
                let fetched = self
                    .fetcher
                    .fetch_markup(url.as_url(), self.timeout, self.cancel, &mut counters.fetches)
                    .await?;
                Ok(Acquired {
                    markup: fetched.markup,
                    strategy,
                    server: Some(ServerKind::from_header(fetched.server.as_deref())),
                })
            }
            Strategy::Alternate => {
                let channel = self.alternate.ok_or(AcquireFailure::Unsupported)?;
                // Counted only once the channel is actually called
                let invoke = async {
                    counters.alternates += 1;
                    channel.alternate_markup(url.as_url(), self.timeout).await
                };
                let markup = run_guarded(invoke, self.timeout, self.cancel).await?;
                Ok(Acquired {
                    markup,
                    strategy,
                    server: None,
                })
            }
        }
    }
}
