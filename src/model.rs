// src/model.rs
// =============================================================================
// The data returned to callers: entries, the folder tree and the crawl result.
//
// Everything here derives Serialize so the CLI can print it as JSON. Field
// names are camelCase in JSON (rawName, generatedAt, durationMs...).
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A folder's relationship to the directory the crawl started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderRole {
    /// The start directory itself
    #[serde(rename = "self")]
    This,
    /// The host's root directory ("/")
    Root,
    /// The canonical parent of the start directory
    Parent,
    /// Anything else, the only role that gets traversed
    Child,
}

/// A file found in a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub url: String,
    pub raw_name: String,
    pub name: String,
    pub hidden: bool,
    pub size: Option<u64>,
    pub date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
}

/// A folder found in a listing (or synthesized for root/parent).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderEntry {
    pub url: String,
    pub raw_name: String,
    pub name: String,
    pub hidden: bool,
    pub size: Option<u64>,
    pub date: Option<DateTime<Utc>>,
    pub role: FolderRole,
    pub depth: usize,
}

/// Either kind of entry, tagged with "kind" in JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entry {
    Folder(FolderEntry),
    File(FileEntry),
}

/// A folder in the result tree with the children and files listed inside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FolderNode {
    #[serde(flatten)]
    pub folder: FolderEntry,
    pub children: Vec<FolderNode>,
    pub files: Vec<FileEntry>,
}

impl FolderNode {
    pub fn new(folder: FolderEntry) -> Self {
        FolderNode {
            folder,
            children: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.folder.url
    }
}

/// Server software guessed from the start directory's `Server` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerKind {
    Apache,
    Nginx,
    Iis,
    Caddy,
    Generic,
}

impl ServerKind {
    pub fn from_header(server: Option<&str>) -> Self {
        let server = match server {
            Some(s) => s.to_ascii_lowercase(),
            None => return ServerKind::Generic,
        };
        if server.contains("nginx") {
            ServerKind::Nginx
        } else if server.contains("apache") {
            ServerKind::Apache
        } else if server.contains("iis") {
            ServerKind::Iis
        } else if server.contains("caddy") {
            ServerKind::Caddy
        } else {
            ServerKind::Generic
        }
    }
}

/// Counters collected during one crawl.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlStats {
    pub fetches: u64,
    pub alternates: u64,
    pub probes: u64,
    pub duration_ms: u64,
    pub max_depth: usize,
}

/// Everything a crawl produces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    /// Normalized start URL
    pub url: String,
    pub root: FolderNode,
    pub folders: Vec<FolderEntry>,
    pub files: Vec<FileEntry>,
    pub entries: Vec<Entry>,
    pub generated_at: DateTime<Utc>,
    pub errors: Vec<String>,
    pub stats: CrawlStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(url: &str, role: FolderRole) -> FolderEntry {
        FolderEntry {
            url: url.to_string(),
            raw_name: String::new(),
            name: String::new(),
            hidden: false,
            size: None,
            date: None,
            role,
            depth: 0,
        }
    }

    #[test]
    fn test_server_kind_from_header() {
        assert_eq!(ServerKind::from_header(Some("Apache/2.4.59 (Unix)")), ServerKind::Apache);
        assert_eq!(ServerKind::from_header(Some("nginx/1.27.1")), ServerKind::Nginx);
        assert_eq!(ServerKind::from_header(Some("Microsoft-IIS/10.0")), ServerKind::Iis);
        assert_eq!(ServerKind::from_header(Some("Caddy")), ServerKind::Caddy);
        assert_eq!(ServerKind::from_header(Some("lighttpd")), ServerKind::Generic);
        assert_eq!(ServerKind::from_header(None), ServerKind::Generic);
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = Entry::Folder(folder("https://example.com/a/", FolderRole::This));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "folder");
        assert_eq!(json["role"], "self");
        assert_eq!(json["rawName"], "");
    }
}
