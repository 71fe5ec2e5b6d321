// src/error.rs
// =============================================================================
// Error types for the crawler.
//
// Two tiers:
// - Fatal errors (CrawlError) abort the whole crawl and go back to the caller
// - Soft errors are plain strings collected into CrawlResult::errors, each
//   starting with a category tag such as "decode:" or "mime:"
// =============================================================================

use std::fmt;
use thiserror::Error;

/// Why a single acquisition strategy failed for a directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquireFailure {
    /// The server answered with something other than 200
    #[error("http {0}")]
    Status(u16),
    /// The response was not an HTML document
    #[error("not html content-type: {0}")]
    NotHtml(String),
    /// The per-acquisition deadline passed
    #[error("timed out")]
    Timeout,
    /// The caller raised the cancellation signal
    #[error("cancelled")]
    Cancelled,
    /// Connection, TLS, DNS or body read problems
    #[error("{0}")]
    Transport(String),
    /// The alternate channel does not exist in this environment
    #[error("alternate channel unavailable")]
    Unsupported,
}

/// The strategy that produced an AcquireFailure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Primary,
    Alternate,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Primary => write!(f, "fetch"),
            Strategy::Alternate => write!(f, "alternate"),
        }
    }
}

/// Fatal errors: any of these ends the crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to acquire {url}: {}", describe_attempts(.attempts))]
    Acquisition {
        url: String,
        attempts: Vec<(Strategy, AcquireFailure)>,
    },

    #[error("alternate channel is not available in this environment ({context})")]
    EnvironmentUnsupported { context: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

fn describe_attempts(attempts: &[(Strategy, AcquireFailure)]) -> String {
    attempts
        .iter()
        .map(|(strategy, failure)| format!("{}: {}", strategy, failure))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Category tag of a soft error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftKind {
    Decode,
    Date,
    Loop,
    Limit,
    Mime,
}

impl SoftKind {
    pub fn tag(self) -> &'static str {
        match self {
            SoftKind::Decode => "decode",
            SoftKind::Date => "date",
            SoftKind::Loop => "loop",
            SoftKind::Limit => "limit",
            SoftKind::Mime => "mime",
        }
    }
}

/// Formats a soft error as "<tag>: <message>".
pub fn soft(kind: SoftKind, message: impl fmt::Display) -> String {
    format!("{}: {}", kind.tag(), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_error_prefix() {
        let msg = soft(SoftKind::Decode, "failed to decode segment 'a%zz'");
        assert_eq!(msg, "decode: failed to decode segment 'a%zz'");
    }

    #[test]
    fn test_acquire_failure_messages() {
        assert_eq!(AcquireFailure::Status(404).to_string(), "http 404");
        assert_eq!(
            AcquireFailure::NotHtml("application/json".to_string()).to_string(),
            "not html content-type: application/json"
        );
        assert_eq!(AcquireFailure::Cancelled.to_string(), "cancelled");
        assert_eq!(
            AcquireFailure::Transport("connection reset".to_string()).to_string(),
            "connection reset"
        );
        // Usable wherever a std error is expected
        let boxed: Box<dyn std::error::Error> = Box::new(AcquireFailure::Timeout);
        assert_eq!(boxed.to_string(), "timed out");
    }

    #[test]
    fn test_acquisition_lists_every_attempt() {
        let err = CrawlError::Acquisition {
            url: "https://example.com/root/".to_string(),
            attempts: vec![
                (Strategy::Primary, AcquireFailure::Status(500)),
                (Strategy::Alternate, AcquireFailure::Timeout),
            ],
        };
        assert_eq!(
            err.to_string(),
            "failed to acquire https://example.com/root/: fetch: http 500; alternate: timed out"
        );
    }
}
