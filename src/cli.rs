// src/cli.rs
// =============================================================================
// Command-line interface, defined with clap's derive API.
//
// Two subcommands:
// - crawl: walk a live directory index
// - parse: run the listing parser over a saved index page, no network
// =============================================================================

use clap::{Parser, Subcommand};
use index_crawler::Mode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "index-crawler",
    version,
    about = "Crawl web-server directory listings into a folder tree",
    long_about = "index-crawler reads autoindex pages (Apache, Nginx, IIS, Caddy and similar), \
                  follows subfolders to a chosen depth and reports every folder and file with \
                  the sizes and dates the listing shows."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a directory index
    ///
    /// Example: index-crawler crawl https://mirror.example.org/pub/ --max-depth 2
    Crawl {
        /// Directory URL to start from
        url: String,

        /// How many levels of subfolders to descend (0 = only the start page)
        #[arg(long, default_value_t = 0)]
        max_depth: i64,

        /// How directory pages are acquired
        #[arg(long, value_enum, default_value_t = Mode::Fetch)]
        mode: Mode,

        /// Probe every file with HEAD to fill in mime type and size
        #[arg(long)]
        metadata: bool,

        /// Probes in flight at once when --metadata is set
        #[arg(long, default_value_t = 4)]
        concurrency: i64,

        /// Per-request timeout in milliseconds
        #[arg(long, default_value_t = 15_000)]
        timeout_ms: i64,

        /// Also record links that point at other hosts
        #[arg(long)]
        cross_origin: bool,

        /// Print the full result as JSON instead of a tree
        #[arg(long)]
        json: bool,
    },

    /// Parse a saved index page
    ///
    /// Example: index-crawler parse listing.html --base https://mirror.example.org/pub/
    Parse {
        /// HTML file to read
        file: PathBuf,

        /// URL the page was served from, used to resolve relative links
        #[arg(long)]
        base: String,

        /// Also record links that point at other hosts
        #[arg(long)]
        cross_origin: bool,

        /// Print the parsed entries as JSON
        #[arg(long)]
        json: bool,
    },
}


// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is max_depth an i64 and not a usize?
//    - The library accepts negative values and clamps them to 0
//    - Passing the raw number through keeps that rule in one place
//
// 2. What does #[arg(value_enum)] do?
//    - Mode derives clap::ValueEnum, so clap knows its possible values
//    - --help lists them and a wrong value is rejected before run() starts
//
// 3. Why PathBuf for the parse file?
//    - File names are not always valid UTF-8; PathBuf holds any OS path
// -----------------------------------------------------------------------------
