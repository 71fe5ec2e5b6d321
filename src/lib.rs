// src/lib.rs
// =============================================================================
// index-crawler: walks web-server directory listings ("Index of /...") and
// returns them as a folder tree plus flat entry lists.
//
// Modules:
// - listing: reads one index page (URLs, names, sizes, dates)
// - acquire: gets the page markup (HTTP fetch or an alternate channel)
// - crawl: the depth-first walk, metadata probes, result assembly
// - model / options / error: the public data types
//
// Quick start:
//   let result = index_crawler::crawl("https://example.com/pub/", &Default::default()).await?;
//   for file in &result.files { println!("{}", file.url); }
// =============================================================================

pub mod acquire;
pub mod crawl;
pub mod error;
pub mod listing;
pub mod model;
pub mod options;

pub use acquire::{AlternateChannel, CancelSignal};
pub use crawl::{crawl, Crawler};
pub use error::{AcquireFailure, CrawlError, Strategy};
pub use model::{
    CrawlResult, CrawlStats, Entry, FileEntry, FolderEntry, FolderNode, FolderRole, ServerKind,
};
pub use options::{CrawlOptions, Mode};
