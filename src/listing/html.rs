// src/listing/html.rs
// =============================================================================
// This module turns a directory-index page into folder and file candidates.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever, so broken markup from old servers still parses
//
// Index pages differ per server:
// - Apache / Nginx autoindex: links inside <pre>, one entry per text line
// - Apache fancy index / Caddy: a <table> with one <tr> per entry
// - IIS: <pre> with "<dir>" markers before folder links
// - Others: <ul>/<ol> lists
// So we look for anchors in those containers first and only fall back to
// every anchor on the page when none of them exist. That keeps navigation
// bars and footers out of the listing.
// =============================================================================

use super::canonical::{canonicalize_url, is_http, last_segment, same_origin, DirectoryUrl};
use super::classify::{classify_entry, decode_segment, is_hidden, CandidateKind};
use super::date::parse_date;
use super::size::parse_size;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

// Listing containers in priority order
const CONTAINER_SELECTORS: [&str; 4] = ["pre a[href]", "table a[href]", "ul a[href]", "ol a[href]"];

/// Name and metadata shared by folder and file candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryMeta {
    pub raw_name: String,
    pub name: String,
    pub hidden: bool,
    pub size: Option<u64>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FolderCandidate {
    pub url: DirectoryUrl,
    pub meta: EntryMeta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileCandidate {
    pub url: Url,
    pub meta: EntryMeta,
}

/// Everything one index page yields, before roles and depths are assigned.
#[derive(Debug, Default)]
pub struct ParsedListing {
    pub folders: Vec<FolderCandidate>,
    pub files: Vec<FileCandidate>,
    pub errors: Vec<String>,
}

struct Selectors {
    containers: Vec<Selector>,
    any_anchor: Selector,
    cells: Selector,
}

impl Selectors {
    // All selectors are constants, parsing them cannot fail
    fn new() -> Self {
        Selectors {
            containers: CONTAINER_SELECTORS.iter().map(|css| selector(css)).collect(),
            any_anchor: selector("a[href]"),
            cells: selector("th, td"),
        }
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Parses an index page.
///
/// Parameters:
///   base: the URL the page was served from (for resolving relative links)
///   html: the page markup
///   same_origin_only: drop links pointing at another scheme/host/port
pub fn parse_listing(base: &Url, html: &str, same_origin_only: bool) -> ParsedListing {
    let document = Html::parse_document(html);
    let selectors = Selectors::new();
    let mut listing = ParsedListing::default();

    // First occurrence of an href wins
    let mut seen = HashSet::new();

    for anchor in listing_anchors(&document, &selectors) {
        let href = match anchor.value().attr("href") {
            Some(href) => href,
            None => continue,
        };
        if !seen.insert(href) {
            continue;
        }

        let resolved = match resolve_href(base, href, same_origin_only) {
            Some(url) => url,
            None => continue,
        };

        let context = metadata_context(anchor, &selectors);
        let context = context.trim();

        let raw_name = last_segment(&resolved).to_string();
        let name = decode_segment(&raw_name, &mut listing.errors);
        let meta = EntryMeta {
            hidden: is_hidden(&name),
            date: parse_date(context, &mut listing.errors),
            size: parse_size(context),
            raw_name,
            name,
        };

        match classify_entry(&resolved, context) {
            CandidateKind::Folder => {
                // resolve_href only lets http(s) through, so this cannot fail
                if let Ok(url) = canonicalize_url(resolved) {
                    listing.folders.push(FolderCandidate { url, meta });
                }
            }
            CandidateKind::File => {
                listing.files.push(FileCandidate { url: resolved, meta });
            }
        }
    }

    listing
}

fn listing_anchors<'a>(document: &'a Html, selectors: &Selectors) -> Vec<ElementRef<'a>> {
    let mut anchors = Vec::new();
    for container in &selectors.containers {
        anchors.extend(document.select(container));
    }
    if anchors.is_empty() {
        anchors.extend(document.select(&selectors.any_anchor));
    }
    anchors
}

// Resolves a possibly-relative href to an absolute URL we want to keep.
//
// Skipped without an error:
//   "#top"                  in-page fragment
//   "?C=N;O=D"              column sort links on Apache/Nginx pages
//   "javascript:..."        script links
//   "mailto:..."            email links
//   "ftp://..."             anything that is not http(s)
//   other origins           when same_origin_only is set
fn resolve_href(base: &Url, href: &str, same_origin_only: bool) -> Option<Url> {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();
    if href.starts_with('#')
        || href.starts_with('?')
        || lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if !is_http(&url) {
        return None;
    }
    if same_origin_only && !same_origin(base, &url) {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

// Text around a link where its size and date usually live:
//   inside a table       -> the cells of its row, joined with spaces
//   inside a list        -> the list item's text
//   inside <pre>         -> the line of text containing the link text
//   anywhere else        -> the parent element's text
fn metadata_context(anchor: ElementRef<'_>, selectors: &Selectors) -> String {
    let ancestors: Vec<ElementRef<'_>> = anchor.ancestors().filter_map(ElementRef::wrap).collect();
    let closest = |tag: &str| ancestors.iter().find(|el| el.value().name() == tag).copied();

    if let Some(row) = closest("tr") {
        let cells: Vec<String> = row.select(&selectors.cells).map(text_of).collect();
        if cells.is_empty() {
            return text_of(row);
        }
        return cells.join(" ");
    }

    if let Some(item) = closest("li") {
        return text_of(item);
    }

    if let Some(pre) = closest("pre") {
        let anchor_text = text_of(anchor);
        let anchor_text = anchor_text.trim();
        if !anchor_text.is_empty() {
            let block = text_of(pre);
            if let Some(line) = block.lines().find(|line| line.contains(anchor_text)) {
                return line.to_string();
            }
        }
        return text_of(anchor);
    }

    match anchor.parent().and_then(ElementRef::wrap) {
        Some(parent) => text_of(parent),
        None => text_of(anchor),
    }
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com/root/";

    fn parse(html: &str) -> ParsedListing {
        parse_listing(&Url::parse(BASE).unwrap(), html, true)
    }

    fn file<'a>(listing: &'a ParsedListing, name: &str) -> &'a FileCandidate {
        listing
            .files
            .iter()
            .find(|f| f.meta.name == name)
            .unwrap_or_else(|| panic!("no file named {}", name))
    }

    fn folder_urls(listing: &ParsedListing) -> Vec<&str> {
        listing.folders.iter().map(|f| f.url.as_str()).collect()
    }

    #[test]
    fn test_apache_table_listing() {
        let html = r#"<!doctype html><html><body>
        <table>
          <tr><th><a href="?C=N;O=D">Name</a></th><th>Last modified</th><th>Size</th></tr>
          <tr><td><a href="/">Parent Directory</a></td><td></td><td>-</td></tr>
          <tr><td><a href="file1.txt">file1.txt</a></td><td>01-Mar-2024 12:00</td><td>123</td></tr>
          <tr><td><a href="sub/">sub/</a></td><td>01-Mar-2024 12:01</td><td>-</td></tr>
        </table>
        </body></html>"#;
        let listing = parse(html);

        let f = file(&listing, "file1.txt");
        assert_eq!(f.meta.size, Some(123));
        assert_eq!(f.meta.date.unwrap().to_rfc3339(), "2024-03-01T12:00:00+00:00");
        assert_eq!(listing.files.len(), 1, "sort links must not become files");
        assert_eq!(
            folder_urls(&listing),
            vec!["https://example.com/", "https://example.com/root/sub/"]
        );
    }

    #[test]
    fn test_nginx_pre_listing() {
        let html = r#"<!doctype html><html><body><h1>Index of /root/</h1><hr><pre>
<a href="../">../</a>
<a href="image.png">image.png</a>                                    01-Mar-2024 12:00                2K
<a href="sub/">sub/</a>                                              01-Mar-2024 12:01                 -
</pre><hr></body></html>"#;
        let listing = parse(html);

        let f = file(&listing, "image.png");
        assert_eq!(f.meta.size, Some(2048));
        assert_eq!(f.url.as_str(), "https://example.com/root/image.png");
        assert!(folder_urls(&listing).contains(&"https://example.com/root/sub/"));
        assert!(folder_urls(&listing).contains(&"https://example.com/"));
    }

    #[test]
    fn test_iis_pre_listing_with_dir_marker() {
        let html = r#"<!doctype html><html><body><pre>
        <A HREF="../">[To Parent Directory]</A><br><br>
        03/01/2024 12:00 PM        &lt;dir&gt; <A HREF="sub">sub</A><br>
        03/01/2024 12:01 PM          931 <A HREF="file.txt">file.txt</A><br>
        </pre></body></html>"#;
        let listing = parse(html);

        let f = file(&listing, "file.txt");
        assert_eq!(f.meta.size, Some(931));
        assert_eq!(f.meta.date.unwrap().to_rfc3339(), "2024-03-01T12:01:00+00:00");
        // No trailing slash, but the <dir> marker makes it a folder
        assert!(folder_urls(&listing).contains(&"https://example.com/root/sub/"));
    }

    #[test]
    fn test_iis_sizes_before_capitalized_names() {
        let html = r#"<!doctype html><html><body><pre>
        03/01/2024 12:01 PM          931 <A HREF="Backup.zip">Backup.zip</A><br>
        03/01/2024 12:02 PM         4096 <A HREF="Music.txt">Music.txt</A><br>
        03/01/2024 12:03 PM          512 <A HREF="Photo.jpg">Photo.jpg</A><br>
        </pre></body></html>"#;
        let listing = parse(html);

        assert_eq!(file(&listing, "Backup.zip").meta.size, Some(931));
        assert_eq!(file(&listing, "Music.txt").meta.size, Some(4096));
        assert_eq!(file(&listing, "Photo.jpg").meta.size, Some(512));
    }

    #[test]
    fn test_caddy_table_listing() {
        let html = r#"<!doctype html><html><body>
        <table>
          <tr><th>Name</th><th>Size</th><th>Modified</th></tr>
          <tr><td><a href="doc.md">doc.md</a></td><td>4K</td><td>2024-03-01 12:00</td></tr>
          <tr><td><a href="sub/">sub/</a></td><td>-</td><td>2024-03-01 12:01</td></tr>
        </table>
        </body></html>"#;
        let listing = parse(html);

        assert_eq!(file(&listing, "doc.md").meta.size, Some(4096));
        let sub = &listing.folders[0];
        assert_eq!(sub.url.as_str(), "https://example.com/root/sub/");
        assert_eq!(sub.meta.name, "sub");
        assert!(sub.meta.date.is_some());
    }

    #[test]
    fn test_folder_rows_keep_their_size() {
        let html = r#"<table>
          <tr><td><a href="iso/">iso/</a></td><td>12K</td><td>2024-03-01 12:00</td></tr>
          <tr><td><a href="src/">src/</a></td><td>-</td><td>2024-03-01 12:01</td></tr>
        </table>"#;
        let listing = parse(html);

        assert_eq!(listing.folders[0].meta.size, Some(12_288));
        assert_eq!(listing.folders[1].meta.size, None);
    }

    #[test]
    fn test_list_item_listing() {
        let html = r#"<ul>
          <li><a href="notes.txt">notes.txt</a> 512</li>
          <li><a href=".hidden/">.hidden/</a></li>
        </ul>"#;
        let listing = parse(html);
        assert_eq!(file(&listing, "notes.txt").meta.size, Some(512));
        assert!(listing.folders[0].meta.hidden);
    }

    #[test]
    fn test_container_anchors_win_over_page_chrome() {
        let html = r#"<div class="nav"><a href="/about.html">About</a></div>
        <pre><a href="data.csv">data.csv</a> 2024-03-01 12:00 10K</pre>"#;
        let listing = parse(html);
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].meta.name, "data.csv");
    }

    #[test]
    fn test_falls_back_to_every_anchor() {
        let html = r#"<div><a href="a.txt">a.txt</a> 3K</div><p><a href="b/">b/</a></p>"#;
        let listing = parse(html);
        assert_eq!(file(&listing, "a.txt").meta.size, Some(3072));
        assert_eq!(folder_urls(&listing), vec!["https://example.com/root/b/"]);
    }

    #[test]
    fn test_duplicate_hrefs_are_dropped() {
        let html = r#"<pre><a href="a.txt">a.txt</a> 1K
<a href="a.txt">a.txt again</a> 2K</pre>"#;
        let listing = parse(html);
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].meta.size, Some(1024));
    }

    #[test]
    fn test_skips_non_listing_links() {
        let html = r##"<pre><a href="#top">top</a>
<a href="mailto:admin@example.com">mail</a>
<a href="javascript:void(0)">js</a>
<a href="ftp://example.com/pub/">ftp</a>
<a href="real.txt#section">real.txt</a></pre>"##;
        let listing = parse(html);
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].url.as_str(), "https://example.com/root/real.txt");
        assert!(listing.folders.is_empty());
    }

    #[test]
    fn test_same_origin_filter() {
        let html = r#"<pre><a href="https://other.example.com/file.txt">file.txt</a> 2024-03-01 12:00 1K</pre>"#;
        let base = Url::parse(BASE).unwrap();

        let strict = parse_listing(&base, html, true);
        assert!(strict.files.is_empty());

        let open = parse_listing(&base, html, false);
        assert_eq!(open.files.len(), 1);
        assert_eq!(open.files[0].meta.size, Some(1024));
    }

    #[test]
    fn test_malformed_percent_encoding_keeps_raw_name() {
        let html = r#"<pre><a href="bad%E0%A4%file.txt">bad%E0%A4%file.txt</a> 2024-03-01 12:00 1K</pre>"#;
        let listing = parse(html);
        assert!(listing.errors.iter().any(|e| e.starts_with("decode:")));
        let f = &listing.files[0];
        assert_eq!(f.meta.raw_name, "bad%E0%A4%file.txt");
        assert_eq!(f.meta.name, f.meta.raw_name);
    }

    #[test]
    fn test_decodes_names() {
        let html = r#"<pre><a href="my%20file.txt">my file.txt</a></pre>"#;
        let listing = parse(html);
        assert_eq!(listing.files[0].meta.raw_name, "my%20file.txt");
        assert_eq!(listing.files[0].meta.name, "my file.txt");
        assert!(listing.errors.is_empty());
    }
}
