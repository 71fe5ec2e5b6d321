// src/listing/classify.rs
// =============================================================================
// Small per-link decisions: folder or file, hidden or not, decoded name.
// =============================================================================

use crate::error::{soft, SoftKind};
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Folder,
    File,
}

fn folder_keyword() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(dir|folder|directory)\b").expect("static regex"))
}

/// Decides whether a resolved link points at a folder or a file.
///
/// A trailing slash always means folder and a name like `a.txt` always means
/// file. Names without either hint are folders only when the text around the
/// link says so (IIS prints `<dir>`); otherwise they count as files.
pub fn classify_entry(url: &Url, context: &str) -> CandidateKind {
    let path = url.path();
    if path.ends_with('/') {
        return CandidateKind::Folder;
    }
    let last = path.rsplit('/').next().unwrap_or("");
    if has_extension(last) {
        return CandidateKind::File;
    }
    if folder_keyword().is_match(context) {
        return CandidateKind::Folder;
    }
    CandidateKind::File
}

// A dot somewhere after the first char and before the last one.
fn has_extension(segment: &str) -> bool {
    if segment.starts_with('.') {
        return false;
    }
    match segment.rfind('.') {
        Some(i) => i + 1 < segment.len(),
        None => false,
    }
}

pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.') && name != "." && name != ".."
}

/// Percent-decodes a path segment, falling back to the raw text.
///
/// A `%` not followed by two hex digits, or bytes that are not UTF-8 after
/// decoding, count as failures and push a `decode:` soft error.
pub fn decode_segment(raw: &str, errors: &mut Vec<String>) -> String {
    match strict_decode(raw) {
        Some(decoded) => decoded,
        None => {
            errors.push(soft(
                SoftKind::Decode,
                format!("failed to decode segment '{}'", raw),
            ));
            raw.to_string()
        }
    }
}

fn strict_decode(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'%' {
            let hex = |j: usize| bytes.get(j).is_some_and(|c| c.is_ascii_hexdigit());
            if !(hex(i + 1) && hex(i + 2)) {
                return None;
            }
        }
    }
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}
