// src/config.rs
// =============================================================================
// Tunable settings for a crawl job.
//
// Every budget and timing value the engine uses lives here, so the CLI and
// the HTTP server can both override them without touching the engine.
//
// Rust concepts:
// - Default trait: Gives us a sensible starting configuration
// - Builder-style setters: `with_*` methods that take and return `self`
// - Duration: Type-safe time spans instead of raw integers
// =============================================================================

use std::time::Duration;

/// Maximum link depth from the seed page (seed = depth 0).
pub const MAX_DEPTH: usize = 6;

/// Maximum number of URLs a single job may discover.
pub const MAX_URLS: usize = 1000;

/// Timeout for fetching one HTML page.
pub const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for robots.txt and sitemap.xml.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed pause before each page fetch.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(100);

/// A Progress event is emitted after every N processed pages.
pub const DEFAULT_PROGRESS_EVERY: usize = 3;

/// Capacity of the bounded channel between the engine and its consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

// Holds all settings for one crawl
//
// #[derive(Clone)] lets every spawned job own its own copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    /// Deepest link level that will be fetched
    pub max_depth: usize,
    /// Upper bound on discovered URLs
    pub max_urls: usize,
    /// Per-page fetch timeout
    pub page_timeout: Duration,
    /// robots.txt / sitemap.xml fetch timeout
    pub fetch_timeout: Duration,
    /// Pause before every page fetch
    pub request_delay: Duration,
    /// Emit a Progress event every N processed pages (0 disables)
    pub progress_every: usize,
    /// Bounded event channel size
    pub channel_capacity: usize,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_urls: MAX_URLS,
            page_timeout: DEFAULT_PAGE_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            request_delay: DEFAULT_REQUEST_DELAY,
            progress_every: DEFAULT_PROGRESS_EVERY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            user_agent: format!("SiteScoutBot/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CrawlConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_urls(mut self, max_urls: usize) -> Self {
        self.max_urls = max_urls;
        self
    }

    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = every;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        // A zero-capacity tokio channel panics on creation
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    // The token robots.txt groups are matched against
    //
    // Example:
    //   "SiteScoutBot/0.1.0 (+https://example.com)" -> "sitescoutbot"
    pub fn robots_agent(&self) -> String {
        self.user_agent
            .split(|c: char| c == '/' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_crawl_budgets() {
        let config = CrawlConfig::default();
        assert_eq!(config.max_depth, 6);
        assert_eq!(config.max_urls, 1000);
        assert_eq!(config.page_timeout, Duration::from_secs(15));
        assert!(config.user_agent.starts_with("SiteScoutBot/"));
    }

    #[test]
    fn test_robots_agent_is_product_token() {
        let config = CrawlConfig::default().with_user_agent("SiteScoutBot/1.0 (+https://x.y)");
        assert_eq!(config.robots_agent(), "sitescoutbot");
    }

    #[test]
    fn test_channel_capacity_never_zero() {
        let config = CrawlConfig::default().with_channel_capacity(0);
        assert_eq!(config.channel_capacity, 1);
    }
}
