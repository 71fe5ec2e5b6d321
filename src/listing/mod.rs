// src/listing/mod.rs
// =============================================================================
// Everything that reads a single directory-index page.
//
// Submodules:
// - canonical: canonical directory URLs, visited keys, parent/root
// - html: extracts folder and file candidates from the page markup
// - classify: folder-or-file, hidden names, percent-decoding
// - date / size: metadata heuristics over the text around each link
//
// None of this touches the network; the crawl module feeds it markup.
// =============================================================================

pub mod canonical;
mod classify;
mod date;
mod html;
mod size;

pub use canonical::{canonicalize, DirectoryUrl};
pub use classify::{classify_entry, is_hidden, CandidateKind};
pub use date::parse_date;
pub use html::{parse_listing, EntryMeta, FileCandidate, FolderCandidate, ParsedListing};
pub use size::parse_size;
