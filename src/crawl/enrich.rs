// src/crawl/enrich.rs
// =============================================================================
// Optional metadata pass: a HEAD request per file.
//
// Listings often leave out sizes and never say what type a file is. When the
// caller asks for metadata, every file gets probed and the answer fills in
// what the listing didn't have:
//   2xx          -> mime from Content-Type, size from Content-Length
//                   (only when the entry has none yet)
//   405 / 501    -> server does not support HEAD, "mime:" soft error
//   other status -> "mime:" soft error naming the status
//   no response  -> "mime:" soft error, entry untouched
//
// Concurrency:
// - All probes are started together with join_all
// - A Semaphore of width enrichment_concurrency lets only that many talk to
//   the server at once; tokio's Semaphore is fair, so files are admitted in
//   list order
// - Each future owns a &mut to exactly one FileEntry, so no locking is needed
// =============================================================================

use crate::acquire::{CancelSignal, HttpFetcher};
use crate::error::{soft, SoftKind};
use crate::model::{FileEntry, FolderNode};
use crate::options::NormalizedOptions;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Outcome of one enrichment pass.
#[derive(Debug, Default)]
pub struct EnrichReport {
    /// Probes that received a response, whatever its status
    pub probes: u64,
    pub errors: Vec<String>,
}

pub async fn enrich_files(
    fetcher: &HttpFetcher,
    files: &mut [FileEntry],
    options: &NormalizedOptions,
) -> EnrichReport {
    if files.is_empty() {
        return EnrichReport::default();
    }

    let gate = Semaphore::new(options.enrichment_concurrency);
    let probes = AtomicU64::new(0);
    let timeout = options.timeout;
    let cancel = options.cancel.as_ref();

    debug!(
        files = files.len(),
        concurrency = options.enrichment_concurrency,
        "probing files"
    );

    let tasks = files.iter_mut().map(|file| {
        let gate = &gate;
        let probes = &probes;
        async move {
            // The semaphore is never closed while this function runs
            let _permit = gate.acquire().await.ok()?;
            probe_file(fetcher, file, timeout, cancel, probes).await
        }
    });

    let errors: Vec<String> = join_all(tasks).await.into_iter().flatten().collect();

    EnrichReport {
        probes: probes.into_inner(),
        errors,
    }
}

// Probes one file and updates it in place. Returns a soft error, if any.
async fn probe_file(
    fetcher: &HttpFetcher,
    file: &mut FileEntry,
    timeout: Duration,
    cancel: Option<&CancelSignal>,
    probes: &AtomicU64,
) -> Option<String> {
    let response = match fetcher.probe(&file.url, timeout, cancel).await {
        Ok(response) => response,
        Err(failure) => {
            warn!(url = %file.url, %failure, "probe failed");
            return Some(soft(
                SoftKind::Mime,
                format!("probe failed for {}: {}", file.url, failure),
            ));
        }
    };
    probes.fetch_add(1, Ordering::Relaxed);

    match response.status {
        200..=299 => {
            if file.mime.is_none() {
                file.mime = response.content_type;
            }
            if file.size.is_none() {
                file.size = response.content_length;
            }
            None
        }
        405 | 501 => Some(soft(
            SoftKind::Mime,
            format!("HEAD not supported for {} (http {})", file.url, response.status),
        )),
        status => Some(soft(
            SoftKind::Mime,
            format!("HEAD {} returned http {}", file.url, status),
        )),
    }
}

/// Copies probed mime/size from the flat list onto the same files in the tree.
pub fn apply_to_tree(root: &mut FolderNode, files: &[FileEntry]) {
    let by_url: HashMap<&str, &FileEntry> = files.iter().map(|f| (f.url.as_str(), f)).collect();
    fill_node(root, &by_url);
}

fn fill_node(node: &mut FolderNode, by_url: &HashMap<&str, &FileEntry>) {
    for file in &mut node.files {
        if let Some(probed) = by_url.get(file.url.as_str()) {
            if file.mime.is_none() {
                file.mime = probed.mime.clone();
            }
            if file.size.is_none() {
                file.size = probed.size;
            }
        }
    }
    for child in &mut node.children {
        fill_node(child, by_url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FolderEntry, FolderRole};
    use crate::options::CrawlOptions;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    fn file(url: String, size: Option<u64>) -> FileEntry {
        FileEntry {
            url,
            raw_name: String::new(),
            name: String::new(),
            hidden: false,
            size,
            date: None,
            mime: None,
        }
    }

    fn options() -> NormalizedOptions {
        CrawlOptions {
            enrichment_concurrency: Some(2),
            timeout_ms: Some(2_000),
            ..Default::default()
        }
        .normalize()
    }

    #[tokio::test]
    async fn test_fills_missing_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/a.iso"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/x-iso9660-image")
                    .insert_header("content-length", "1024"),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/b.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain")
                    .insert_header("content-length", "99"),
            )
            .mount(&server)
            .await;

        let mut files = vec![
            file(format!("{}/a.iso", server.uri()), None),
            file(format!("{}/b.txt", server.uri()), Some(2048)),
        ];
        let fetcher = HttpFetcher::new().unwrap();
        let report = enrich_files(&fetcher, &mut files, &options()).await;

        assert_eq!(report.probes, 2);
        assert!(report.errors.is_empty());
        assert_eq!(files[0].mime.as_deref(), Some("application/x-iso9660-image"));
        assert_eq!(files[0].size, Some(1024));
        // Listing size wins over Content-Length
        assert_eq!(files[1].size, Some(2048));
        assert_eq!(files[1].mime.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_status_errors() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/no-head"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut files = vec![
            file(format!("{}/no-head", server.uri()), None),
            file(format!("{}/gone", server.uri()), None),
        ];
        let fetcher = HttpFetcher::new().unwrap();
        let report = enrich_files(&fetcher, &mut files, &options()).await;

        assert_eq!(report.probes, 2);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.iter().all(|e| e.starts_with("mime:")));
        assert!(report.errors.iter().any(|e| e.contains("not supported")));
        assert!(report.errors.iter().any(|e| e.contains("http 404")));
        assert!(files.iter().all(|f| f.mime.is_none()));
    }

    #[tokio::test]
    async fn test_cancelled_probes_do_not_count() {
        let server = MockServer::start().await;
        let signal = CancelSignal::new();
        signal.cancel();
        let opts = CrawlOptions {
            cancel: Some(signal),
            ..Default::default()
        }
        .normalize();

        let mut files = vec![file(format!("{}/x", server.uri()), None)];
        let fetcher = HttpFetcher::new().unwrap();
        let report = enrich_files(&fetcher, &mut files, &opts).await;

        assert_eq!(report.probes, 0);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("cancelled"));
    }

    // Records when each HEAD arrives, then answers after `delay`
    struct ArrivalLog {
        arrivals: Arc<Mutex<Vec<Instant>>>,
        delay: Duration,
    }

    impl Respond for ArrivalLog {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            self.arrivals.lock().unwrap().push(Instant::now());
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain")
                .set_delay(self.delay)
        }
    }

    #[tokio::test]
    async fn test_probes_stay_within_concurrency() {
        let server = MockServer::start().await;
        let arrivals = Arc::new(Mutex::new(Vec::new()));
        let delay = Duration::from_millis(200);
        Mock::given(method("HEAD"))
            .respond_with(ArrivalLog {
                arrivals: arrivals.clone(),
                delay,
            })
            .expect(6)
            .mount(&server)
            .await;

        let mut files: Vec<FileEntry> = (0..6)
            .map(|i| file(format!("{}/f{}.txt", server.uri(), i), None))
            .collect();
        let fetcher = HttpFetcher::new().unwrap();
        let started = Instant::now();
        let report = enrich_files(&fetcher, &mut files, &options()).await;

        assert_eq!(report.probes, 6);
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert!(files.iter().all(|f| f.mime.as_deref() == Some("text/plain")));
        // Two at a time, six files: at least three rounds of `delay`
        assert!(started.elapsed() >= delay * 3, "{:?}", started.elapsed());

        // A new probe only starts once an earlier one has finished, so no
        // half-delay window ever sees more than two arrivals
        let arrivals = arrivals.lock().unwrap();
        for &at in arrivals.iter() {
            let window_start = at - delay / 2;
            let overlapping = arrivals
                .iter()
                .filter(|&&other| other >= window_start && other <= at)
                .count();
            assert!(overlapping <= 2, "{} probes in flight", overlapping);
        }
    }

    #[test]
    fn test_apply_to_tree() {
        let folder = FolderEntry {
            url: "https://x/".to_string(),
            raw_name: String::new(),
            name: String::new(),
            hidden: false,
            size: None,
            date: None,
            role: FolderRole::This,
            depth: 0,
        };
        let mut child = FolderNode::new(FolderEntry {
            url: "https://x/sub/".to_string(),
            role: FolderRole::Child,
            depth: 1,
            ..folder.clone()
        });
        child.files.push(file("https://x/sub/a.bin".to_string(), None));
        let mut root = FolderNode::new(folder);
        root.children.push(child);

        let mut probed = file("https://x/sub/a.bin".to_string(), Some(10));
        probed.mime = Some("application/octet-stream".to_string());
        apply_to_tree(&mut root, &[probed]);

        let leaf = &root.children[0].files[0];
        assert_eq!(leaf.size, Some(10));
        assert_eq!(leaf.mime.as_deref(), Some("application/octet-stream"));
    }
}
