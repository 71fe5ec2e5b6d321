// src/crawl/state.rs
// =============================================================================
// Mutable bookkeeping shared by every step of one crawl.
//
// Rust concepts:
// - HashSet: visited directories and (url, role) pairs, O(1) lookups
// - Owned Vecs: the flat folder and file lists end up in the CrawlResult
//   as they are, no copying at the end
// =============================================================================

use crate::acquire::AcquireCounters;
use crate::error::{soft, SoftKind};
use crate::listing::DirectoryUrl;
use crate::model::{FileEntry, FolderEntry, FolderRole, ServerKind};
use std::collections::HashSet;
use std::fmt;

/// Entries recorded before a crawl stops expanding directories.
pub const ENTRY_LIMIT: u64 = 50_000;

#[derive(Debug)]
pub struct TraversalState {
    visited: HashSet<String>,
    folder_keys: HashSet<(String, FolderRole)>,
    pub folders: Vec<FolderEntry>,
    pub files: Vec<FileEntry>,
    pub errors: Vec<String>,
    pub counters: AcquireCounters,
    pub probes: u64,
    /// Folder and file entries recorded so far
    pub safety_count: u64,
    pub entry_limit: u64,
    pub max_depth_reached: usize,
    pub server: Option<ServerKind>,
}

impl TraversalState {
    pub fn new(entry_limit: u64) -> Self {
        TraversalState {
            visited: HashSet::new(),
            folder_keys: HashSet::new(),
            folders: Vec::new(),
            files: Vec::new(),
            errors: Vec::new(),
            counters: AcquireCounters::default(),
            probes: 0,
            safety_count: 0,
            entry_limit,
            max_depth_reached: 0,
            server: None,
        }
    }

    /// Marks a directory as visited. Returns false if it already was.
    pub fn mark_visited(&mut self, dir: &DirectoryUrl) -> bool {
        self.visited.insert(dir.visited_key())
    }

    /// Adds a folder to the flat list unless the same URL with the same
    /// role is already there.
    pub fn record_folder(&mut self, entry: FolderEntry) -> bool {
        if !self.folder_keys.insert((entry.url.clone(), entry.role)) {
            return false;
        }
        self.folders.push(entry);
        true
    }

    /// True if the URL is in the flat folder list under any role.
    pub fn has_folder_url(&self, url: &str) -> bool {
        self.folders.iter().any(|f| f.url == url)
    }

    pub fn push_error(&mut self, kind: SoftKind, message: impl fmt::Display) {
        self.errors.push(soft(kind, message));
    }

    pub fn limit_exceeded(&self) -> bool {
        self.safety_count > self.entry_limit
    }
}

impl Default for TraversalState {
    fn default() -> Self {
        Self::new(ENTRY_LIMIT)
    }
}
