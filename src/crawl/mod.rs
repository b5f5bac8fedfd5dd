// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Submodules, leaf-first:
// - normalize: Canonical URL keys, seed resolution, same-domain test
// - policy: Which URLs must never be fetched
// - robots: robots.txt -> disallowed path prefixes
// - sitemap: sitemap.xml -> URL list (shortcut that replaces crawling)
// - page: Fetch one page, extract its new links
// - queue: CrawlJob, the frontier and discovered/visited sets
// - events: CrawlEvent and the EventSink trait
// - engine: Crawler, the state machine tying everything together
// =============================================================================

mod engine;
mod events;
mod normalize;
mod page;
mod policy;
mod queue;
mod robots;
mod sitemap;

// Re-export the public API so callers can write `crawl::Crawler`
pub use engine::{estimate_eta, Crawler};
pub use events::{CrawlEvent, EventSink, SinkClosed};
pub use normalize::{is_same_domain, normalize_url, resolve_seed};
pub use page::{extract_links, fetch_and_extract_links};
pub use policy::{is_disallowed, should_skip};
pub use queue::{CrawlItem, CrawlJob, CrawlResult, DiscoveredPage, DiscoverySource};
pub use robots::{fetch_robots, fetch_robots_policy, parse_robots, RobotsFetch};
pub use sitemap::{fetch_sitemap, parse_sitemap_locs};
