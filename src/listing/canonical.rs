// src/listing/canonical.rs
// =============================================================================
// Canonical directory URLs.
//
// A directory URL is canonical when:
// - its scheme is http or https
// - its path has no repeated slashes ("//a///b" becomes "/a/b")
// - its path ends with a slash
// - it carries no query string or fragment
//
// The `url` crate already lower-cases hosts and resolves dot segments, so two
// canonical URLs name the same directory exactly when their strings are equal.
// =============================================================================

use crate::error::CrawlError;
use std::fmt;
use url::Url;

/// An absolute, canonical directory URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryUrl(Url);

impl DirectoryUrl {
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Key for the visited set: scheme + lower-cased host + path.
    pub fn visited_key(&self) -> String {
        let host = self.0.host_str().unwrap_or("").to_ascii_lowercase();
        match self.0.port() {
            Some(port) => format!("{}://{}:{}{}", self.0.scheme(), host, port, self.0.path()),
            None => format!("{}://{}{}", self.0.scheme(), host, self.0.path()),
        }
    }

    /// The directory one level up, or None at the host root.
    pub fn parent(&self) -> Option<DirectoryUrl> {
        let mut parts: Vec<&str> = path_segments(&self.0).collect();
        if parts.pop().is_none() {
            return None;
        }
        let path = if parts.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", parts.join("/"))
        };
        let mut url = self.0.clone();
        url.set_path(&path);
        Some(DirectoryUrl(url))
    }

    /// The host's root directory.
    pub fn root(&self) -> DirectoryUrl {
        let mut url = self.0.clone();
        url.set_path("/");
        DirectoryUrl(url)
    }
}

impl fmt::Display for DirectoryUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Parses and canonicalizes a directory URL given as a string.
pub fn canonicalize(input: &str) -> Result<DirectoryUrl, CrawlError> {
    let url = Url::parse(input.trim()).map_err(|e| CrawlError::InvalidUrl {
        url: input.to_string(),
        reason: e.to_string(),
    })?;
    canonicalize_url(url)
}

/// Canonicalizes an already parsed URL.
pub fn canonicalize_url(mut url: Url) -> Result<DirectoryUrl, CrawlError> {
    if !is_http(&url) {
        return Err(CrawlError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme: {}", url.scheme()),
        });
    }
    if url.host_str().is_none() {
        return Err(CrawlError::InvalidUrl {
            url: url.to_string(),
            reason: "missing host".to_string(),
        });
    }

    let mut path = collapse_slashes(url.path());
    if !path.ends_with('/') {
        path.push('/');
    }
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);
    Ok(DirectoryUrl(url))
}

pub fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// The last non-empty path segment, still percent-encoded.
pub fn last_segment(url: &Url) -> &str {
    path_segments(url).last().unwrap_or("")
}

fn path_segments(url: &Url) -> impl Iterator<Item = &str> {
    url.path().split('/').filter(|s| !s.is_empty())
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !previous_slash {
                out.push(c);
            }
            previous_slash = true;
        } else {
            out.push(c);
            previous_slash = false;
        }
    }
    out
}
