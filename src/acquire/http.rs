// src/acquire/http.rs
// =============================================================================
// The primary transport: plain HTTP with reqwest.
//
// Two requests are made here:
// - GET for directory pages (must be 200 and HTML)
// - HEAD for file probes during metadata enrichment
//
// Both run under the per-request timeout and the crawl's cancel signal.
// =============================================================================

use super::cancel::{run_guarded, CancelSignal};
use crate::error::AcquireFailure;
use reqwest::header::{HeaderMap, HeaderName, ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, SERVER};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const MAX_REDIRECTS: usize = 10;

/// A directory page fetched over HTTP.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub markup: String,
    /// Raw `Server` header, if any
    pub server: Option<String>,
}

/// What a HEAD probe learned about a file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// reqwest client shared by every request of a crawl.
///
/// Client is cheap to clone (it's a reference counter internally).
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!("index-crawler/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// GETs a directory page.
    ///
    /// `fetches` goes up by one whenever a response arrives, whether or not
    /// it turns out to be usable.
    pub async fn fetch_markup(
        &self,
        url: &Url,
        timeout: Duration,
        cancel: Option<&CancelSignal>,
        fetches: &mut u64,
    ) -> Result<Fetched, AcquireFailure> {
        let request = async {
            let response = self
                .client
                .get(url.clone())
                .header(ACCEPT, ACCEPT_HTML)
                .timeout(timeout)
                .send()
                .await
                .map_err(transport_failure)?;
            *fetches += 1;

            let status = response.status();
            if status != StatusCode::OK {
                return Err(AcquireFailure::Status(status.as_u16()));
            }

            let content_type = header(response.headers(), CONTENT_TYPE).unwrap_or_default();
            if !is_html(&content_type) {
                return Err(AcquireFailure::NotHtml(content_type));
            }

            let server = header(response.headers(), SERVER);
            let markup = response.text().await.map_err(transport_failure)?;
            Ok(Fetched { markup, server })
        };

        run_guarded(request, timeout, cancel).await
    }

    /// HEADs a file. Any status counts as a response; only transport
    /// problems, timeouts and cancellation are errors.
    pub async fn probe(
        &self,
        url: &str,
        timeout: Duration,
        cancel: Option<&CancelSignal>,
    ) -> Result<ProbeResponse, AcquireFailure> {
        let request = async {
            let response = self
                .client
                .head(url)
                .timeout(timeout)
                .send()
                .await
                .map_err(transport_failure)?;

            let headers = response.headers();
            Ok(ProbeResponse {
                status: response.status().as_u16(),
                content_type: header(headers, CONTENT_TYPE),
                content_length: header(headers, CONTENT_LENGTH).and_then(|v| v.trim().parse().ok()),
            })
        };

        run_guarded(request, timeout, cancel).await
    }
}

fn header(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn is_html(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    lower.contains("text/html") || lower.contains("application/xhtml+xml")
}

// Maps reqwest errors onto acquisition failures
fn transport_failure(error: reqwest::Error) -> AcquireFailure {
    if error.is_timeout() {
        AcquireFailure::Timeout
    } else if error.is_redirect() {
        AcquireFailure::Transport("too many redirects".to_string())
    } else if error.is_connect() {
        AcquireFailure::Transport(format!("connection failed: {}", error))
    } else {
        AcquireFailure::Transport(error.to_string())
    }
}
