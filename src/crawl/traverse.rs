// src/crawl/traverse.rs
// =============================================================================
// Depth-first walk over directory listings.
//
// How it works:
// 1. Canonicalize the start URL and mark it visited
// 2. Load the start directory: acquire its markup, parse it, record every
//    folder and file, attach "child" folders to the tree
// 3. For the start node only, add root/parent placeholders the listing
//    did not show
// 4. For each child not visited yet: mark it, load it, descend
//    (pre-order), until depth reaches max_depth
//
// A folder's role compares its URL with the start directory:
//   same as start      -> self
//   host root "/"      -> root
//   start's parent     -> parent
//   anything else      -> child (the only role we ever descend into)
//
// Rust concepts:
// - BoxFuture: an async fn can't call itself directly (its future would
//   contain itself and have infinite size), so the recursive step returns
//   a pinned, boxed future instead
// =============================================================================

use super::state::TraversalState;
use crate::acquire::Acquirer;
use crate::error::{CrawlError, SoftKind, Strategy};
use crate::listing::canonical::last_segment;
use crate::listing::{canonicalize, parse_listing, DirectoryUrl, FileCandidate, FolderCandidate};
use crate::model::{FileEntry, FolderEntry, FolderNode, FolderRole};
use crate::options::NormalizedOptions;
use futures::future::{BoxFuture, FutureExt};
use percent_encoding::percent_decode_str;
use tracing::{debug, info, warn};

// The three directories every role is measured against
struct Anchors {
    start: String,
    root: String,
    parent: Option<String>,
}

impl Anchors {
    fn new(start: &DirectoryUrl) -> Self {
        Anchors {
            start: start.visited_key(),
            root: start.root().visited_key(),
            parent: start.parent().map(|p| p.visited_key()),
        }
    }

    fn role_of(&self, url: &DirectoryUrl) -> FolderRole {
        let key = url.visited_key();
        if key == self.start {
            FolderRole::This
        } else if key == self.root {
            FolderRole::Root
        } else if self.parent.as_deref() == Some(key.as_str()) {
            FolderRole::Parent
        } else {
            FolderRole::Child
        }
    }
}

pub struct Traversal<'a> {
    acquirer: Acquirer<'a>,
    options: &'a NormalizedOptions,
    state: &'a mut TraversalState,
}

impl<'a> Traversal<'a> {
    pub fn new(
        acquirer: Acquirer<'a>,
        options: &'a NormalizedOptions,
        state: &'a mut TraversalState,
    ) -> Self {
        Traversal {
            acquirer,
            options,
            state,
        }
    }

    /// Walks from `start` and returns the tree rooted at it.
    ///
    /// Everything else the walk finds (flat lists, soft errors, counters)
    /// accumulates in the TraversalState.
    pub async fn run(&mut self, start: &str) -> Result<FolderNode, CrawlError> {
        let start = canonicalize(start)?;
        let mut node = FolderNode::new(synthesized(&start, FolderRole::This));

        if !self.state.mark_visited(&start) {
            warn!(url = %start, "start directory already visited");
            self.state
                .push_error(SoftKind::Loop, format!("already visited {}", start));
            return Ok(node);
        }

        let anchors = Anchors::new(&start);
        self.state.record_folder(node.folder.clone());

        info!(url = %start, max_depth = self.options.max_depth, "walking directory tree");
        self.load_directory(&mut node, &start, &anchors).await?;
        self.add_placeholders(&start);
        self.expand(&mut node, &anchors).await?;

        Ok(node)
    }

    // Acquires and parses one directory, filling `node` with what it lists.
    async fn load_directory(
        &mut self,
        node: &mut FolderNode,
        dir: &DirectoryUrl,
        anchors: &Anchors,
    ) -> Result<(), CrawlError> {
        if self.state.limit_exceeded() {
            warn!(url = %dir, limit = self.state.entry_limit, "entry limit exceeded");
            self.state.push_error(
                SoftKind::Limit,
                format!(
                    "entry limit of {} exceeded, not expanding {}",
                    self.state.entry_limit, dir
                ),
            );
            return Ok(());
        }

        debug!(url = %dir, depth = node.folder.depth, "loading directory");
        let acquired = self.acquirer.acquire(dir, &mut self.state.counters).await?;
        if acquired.strategy == Strategy::Alternate {
            info!(url = %dir, "listing loaded through the alternate channel");
        }
        if node.folder.role == FolderRole::This && self.state.server.is_none() {
            self.state.server = acquired.server;
        }

        let listing = parse_listing(dir.as_url(), &acquired.markup, self.options.same_origin_only);
        self.state.errors.extend(listing.errors);

        for candidate in listing.folders {
            let role = anchors.role_of(&candidate.url);
            // Depth counts tree levels, not path segments: "c/d/" and "/z/"
            // listed here both sit one level below this node
            let depth = match role {
                FolderRole::Child => node.folder.depth + 1,
                _ => 0,
            };
            let entry = folder_entry(candidate, role, depth);
            self.state.safety_count += 1;

            // "sub/" and "./sub/" are different hrefs for the same folder
            let attach = role == FolderRole::Child
                && !node.children.iter().any(|c| c.folder.url == entry.url);
            if attach {
                node.children.push(FolderNode::new(entry.clone()));
            }
            self.state.record_folder(entry);
        }

        for candidate in listing.files {
            let entry = file_entry(candidate);
            self.state.safety_count += 1;
            self.state.files.push(entry.clone());
            node.files.push(entry);
        }

        debug!(
            url = %dir,
            children = node.children.len(),
            files = node.files.len(),
            "directory parsed"
        );
        Ok(())
    }

    // Root and parent of the start directory are always present in the flat
    // folder list, even when the listing has no link to them.
    fn add_placeholders(&mut self, start: &DirectoryUrl) {
        let root = start.root();
        let parent = start.parent();
        let wanted = [(Some(root), FolderRole::Root), (parent, FolderRole::Parent)];

        for (url, role) in wanted {
            let url = match url {
                Some(url) => url,
                None => continue,
            };
            if self.state.has_folder_url(url.as_str()) {
                continue;
            }
            self.state.safety_count += 1;
            self.state.record_folder(synthesized(&url, role));
        }
    }

    // Descends into the children of a loaded `node`.
    fn expand<'b>(
        &'b mut self,
        node: &'b mut FolderNode,
        anchors: &'b Anchors,
    ) -> BoxFuture<'b, Result<(), CrawlError>> {
        async move {
            let depth = node.folder.depth;
            self.state.max_depth_reached = self.state.max_depth_reached.max(depth);
            if depth >= self.options.max_depth {
                return Ok(());
            }

            for child in node.children.iter_mut() {
                if child.folder.role != FolderRole::Child {
                    continue;
                }
                let dir = canonicalize(child.url())?;
                if !self.state.mark_visited(&dir) {
                    debug!(url = %dir, "already visited, skipping");
                    continue;
                }
                self.load_directory(child, &dir, anchors).await?;
                self.expand(child, anchors).await?;
            }
            Ok(())
        }
        .boxed()
    }
}

fn folder_entry(candidate: FolderCandidate, role: FolderRole, depth: usize) -> FolderEntry {
    let meta = candidate.meta;
    FolderEntry {
        url: candidate.url.to_string(),
        raw_name: meta.raw_name,
        name: meta.name,
        hidden: meta.hidden,
        size: meta.size,
        date: meta.date,
        role,
        depth,
    }
}

fn file_entry(candidate: FileCandidate) -> FileEntry {
    let meta = candidate.meta;
    FileEntry {
        url: candidate.url.to_string(),
        raw_name: meta.raw_name,
        name: meta.name,
        hidden: meta.hidden,
        size: meta.size,
        date: meta.date,
        mime: None,
    }
}

// Entry for a directory we know about without having seen it in a listing
fn synthesized(url: &DirectoryUrl, role: FolderRole) -> FolderEntry {
    let raw_name = last_segment(url.as_url()).to_string();
    let name = percent_decode_str(&raw_name).decode_utf8_lossy().into_owned();
    FolderEntry {
        url: url.to_string(),
        hidden: crate::listing::is_hidden(&name),
        raw_name,
        name,
        size: None,
        date: None,
        role,
        depth: 0,
    }
}


// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does Traversal hold `&'a mut TraversalState`?
//    - The walk is strictly sequential, so one mutable borrow is enough
//    - No Arc<Mutex<...>> is needed and the state can't change behind our back
//
// 2. Why is expand() not an `async fn`?
//    - A recursive async fn would have a future type of infinite size
//    - `.boxed()` puts the future on the heap, giving it a fixed size
//
// 3. Why is a failed child fatal?
//    - A partial tree that silently misses a folder looks complete
//    - The caller gets the URL and every strategy's failure instead
// -----------------------------------------------------------------------------
