// src/lib.rs
// =============================================================================
// site-scout: a bounded, polite, same-domain website crawler.
//
// Give it a seed URL and it discovers the pages of that site, honoring
// robots.txt and preferring sitemap.xml when the site has one. Progress is
// streamed as CrawlEvents, either in-process (transport::CrawlSession) or
// as server-sent events over HTTP (transport::sse).
//
// Modules:
// - config: Budgets, timeouts and pacing
// - crawl: The engine and its building blocks
// - error: CrawlError
// - transport: Ways to run a crawl and consume its events
// =============================================================================

pub mod config;
pub mod crawl;
pub mod error;
pub mod transport;

pub use config::CrawlConfig;
pub use crawl::{CrawlEvent, CrawlResult, Crawler};
pub use error::CrawlError;
pub use transport::CrawlSession;
