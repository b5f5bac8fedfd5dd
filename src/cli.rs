// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands share one set of crawl flags:
// - crawl: run a crawl here and print its progress
// - serve: expose crawls as a server-sent events endpoint
//
// Rust concepts:
// - Derive macros: Parser, Subcommand and Args generate the parsing code
// - #[command(flatten)]: Embeds a reusable group of arguments
// =============================================================================

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use site_scout::config::{self, CrawlConfig};

#[derive(Parser, Debug)]
#[command(
    name = "site-scout",
    version,
    about = "Discover the pages of a website, politely",
    long_about = "site-scout crawls a single website breadth-first, honoring robots.txt \
                  and using sitemap.xml when available, and streams its progress."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website and print the discovered URLs
    ///
    /// Example: site-scout crawl https://example.com --max-depth 2
    Crawl {
        /// Website URL to crawl (the scheme may be omitted)
        website_url: String,

        /// Print every event as a JSON line instead of human-readable output
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        options: CrawlArgs,
    },

    /// Serve crawls over HTTP as server-sent events
    ///
    /// Example: site-scout serve --addr 0.0.0.0:8787
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8787")]
        addr: SocketAddr,

        #[command(flatten)]
        options: CrawlArgs,
    },
}

// Flags that tune a crawl job
#[derive(Args, Debug, Clone)]
pub struct CrawlArgs {
    /// Maximum link depth from the start page
    #[arg(long, default_value_t = config::MAX_DEPTH)]
    pub max_depth: usize,

    /// Maximum number of URLs to discover
    #[arg(long, default_value_t = config::MAX_URLS)]
    pub max_urls: usize,

    /// Per-page fetch timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_PAGE_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// robots.txt / sitemap.xml timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_FETCH_TIMEOUT.as_secs())]
    pub fetch_timeout_secs: u64,

    /// Delay before each page request, in milliseconds
    #[arg(long, default_value_t = config::DEFAULT_REQUEST_DELAY.as_millis() as u64)]
    pub delay_ms: u64,

    /// Emit a progress event every N pages (0 disables)
    #[arg(long, default_value_t = config::DEFAULT_PROGRESS_EVERY)]
    pub progress_every: usize,

    /// Override the User-Agent header
    #[arg(long)]
    pub user_agent: Option<String>,
}

impl CrawlArgs {
    pub fn to_config(&self) -> CrawlConfig {
        let config = CrawlConfig::default()
            .with_max_depth(self.max_depth)
            .with_max_urls(self.max_urls)
            .with_page_timeout(Duration::from_secs(self.timeout_secs))
            .with_fetch_timeout(Duration::from_secs(self.fetch_timeout_secs))
            .with_request_delay(Duration::from_millis(self.delay_ms))
            .with_progress_every(self.progress_every);

        match &self.user_agent {
            Some(user_agent) => config.with_user_agent(user_agent.clone()),
            None => config,
        }
    }
}
