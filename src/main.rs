// src/main.rs
// =============================================================================
// This is the entry point of the index-crawler CLI.
//
// What happens here:
// 1. Set up logging (tracing, to stderr, filtered by RUST_LOG)
// 2. Parse command-line arguments using clap
// 3. Dispatch to the subcommand handler
// 4. Print a tree or JSON
// 5. Exit with proper code (0 = clean, 1 = soft errors, 2 = fatal error)
//
// Rust concepts used:
// - async/await: the crawler talks to the network
// - Result<T, E> and ?: fatal errors bubble up to main()
// - tokio::spawn: a background task waits for Ctrl-C
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use index_crawler::listing::parse_listing;
use index_crawler::{CancelSignal, CrawlOptions, CrawlResult, Crawler, FileEntry, FolderNode, Mode};
use serde_json::json;
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

#[tokio::main]
async fn main() {
    init_logging();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so --json output on stdout stays parseable.
// Default level is warn; RUST_LOG=index_crawler=debug shows every request.
fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

// Returns:
//   Ok(0) = finished, no soft errors
//   Ok(1) = finished, with soft errors
//   Err   = fatal error (main turns it into exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl {
            url,
            max_depth,
            mode,
            metadata,
            concurrency,
            timeout_ms,
            cross_origin,
            json,
        } => {
            let options = CrawlOptions {
                max_depth: Some(max_depth),
                mode: Some(mode),
                include_metadata: Some(metadata),
                enrichment_concurrency: Some(concurrency),
                timeout_ms: Some(timeout_ms),
                same_origin_only: Some(!cross_origin),
                cancel: None,
            };
            handle_crawl(&url, options, json).await
        }
        Commands::Parse {
            file,
            base,
            cross_origin,
            json,
        } => handle_parse(&file, &base, cross_origin, json).await,
    }
}

async fn handle_crawl(url: &str, mut options: CrawlOptions, json: bool) -> Result<i32> {
    if !json {
        println!("🔍 Crawling: {}", url);
        if options.mode == Some(Mode::Alternate) {
            println!("⚠️  No alternate channel is available from the command line");
        }
    }

    // Ctrl-C raises the cancel signal; whatever request is in flight stops
    let cancel = CancelSignal::new();
    options.cancel = Some(cancel.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n⏹️  Cancelling...");
            cancel.cancel();
        }
    });

    let crawler = Crawler::new()?;
    let result = crawler
        .crawl(url, &options)
        .await
        .with_context(|| format!("crawl of {} failed", url))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_tree(&result);
    }

    Ok(exit_code(&result.errors))
}

async fn handle_parse(file: &Path, base: &str, cross_origin: bool, json: bool) -> Result<i32> {
    let html = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let base = Url::parse(base).with_context(|| format!("invalid base url '{}'", base))?;

    let listing = parse_listing(&base, &html, !cross_origin);

    if json {
        let folders: Vec<_> = listing
            .folders
            .iter()
            .map(|f| {
                json!({
                    "url": f.url.as_str(),
                    "rawName": f.meta.raw_name,
                    "name": f.meta.name,
                    "hidden": f.meta.hidden,
                    "size": f.meta.size,
                    "date": f.meta.date,
                })
            })
            .collect();
        let files: Vec<_> = listing
            .files
            .iter()
            .map(|f| {
                json!({
                    "url": f.url.as_str(),
                    "rawName": f.meta.raw_name,
                    "name": f.meta.name,
                    "hidden": f.meta.hidden,
                    "size": f.meta.size,
                    "date": f.meta.date,
                })
            })
            .collect();
        let output = json!({ "folders": folders, "files": files, "errors": listing.errors });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("📄 {} ({})", file.display(), base);
        for folder in &listing.folders {
            println!("   📁 {}", folder.meta.name);
        }
        for entry in &listing.files {
            println!("   📄 {}{}", entry.meta.name, describe(entry.meta.size, entry.meta.date.as_ref()));
        }
        println!();
        println!("📊 {} folder(s), {} file(s)", listing.folders.len(), listing.files.len());
        print_errors(&listing.errors);
    }

    Ok(exit_code(&listing.errors))
}

fn exit_code(errors: &[String]) -> i32 {
    if errors.is_empty() {
        0
    } else {
        1
    }
}

// Prints the result as an indented tree followed by a summary
fn print_tree(result: &CrawlResult) {
    println!();
    match result.server {
        Some(server) => println!("📂 {}  ({:?})", result.url, server),
        None => println!("📂 {}", result.url),
    }
    print_children(&result.root, "");

    println!();
    println!("📊 Summary:");
    println!("   📁 Folders: {}", result.folders.len());
    println!("   📄 Files: {}", result.files.len());
    println!("   🌐 Fetches: {}", result.stats.fetches);
    if result.stats.alternates > 0 {
        println!("   🔀 Alternate loads: {}", result.stats.alternates);
    }
    if result.stats.probes > 0 {
        println!("   🔎 Probes: {}", result.stats.probes);
    }
    println!("   ⏱️  Took: {} ms", result.stats.duration_ms);
    print_errors(&result.errors);
}

fn print_children(node: &FolderNode, prefix: &str) {
    let total = node.children.len() + node.files.len();
    let mut index = 0;

    for child in &node.children {
        index += 1;
        let (branch, next) = branch(index == total);
        println!("{}{}📁 {}/", prefix, branch, child.folder.name);
        print_children(child, &format!("{}{}", prefix, next));
    }
    for file in &node.files {
        index += 1;
        let (branch, _) = branch(index == total);
        println!("{}{}{}", prefix, branch, describe_file(file));
    }
}

fn branch(last: bool) -> (&'static str, &'static str) {
    if last {
        ("└── ", "    ")
    } else {
        ("├── ", "│   ")
    }
}

fn describe_file(file: &FileEntry) -> String {
    let mut line = format!("📄 {}{}", file.name, describe(file.size, file.date.as_ref()));
    if let Some(mime) = &file.mime {
        line.push_str(&format!("  [{}]", mime));
    }
    line
}

fn describe(size: Option<u64>, date: Option<&chrono::DateTime<chrono::Utc>>) -> String {
    let mut out = String::new();
    if let Some(size) = size {
        out.push_str(&format!("  {}", human_size(size)));
    }
    if let Some(date) = date {
        out.push_str(&format!("  {}", date.format("%Y-%m-%d %H:%M")));
    }
    out
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KiB", "MiB", "GiB", "TiB", "PiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn print_errors(errors: &[String]) {
    if errors.is_empty() {
        println!("   ✅ No problems");
        return;
    }
    println!("   ⚠️  Problems: {}", errors.len());
    for error in errors {
        println!("      - {}", error);
    }
}
