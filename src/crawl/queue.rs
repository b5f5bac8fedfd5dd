// src/crawl/queue.rs
// =============================================================================
// The frontier and bookkeeping of one crawl job.
//
// How it works:
// 1. The seed URL enters `discovered` and the queue at depth 0
// 2. The engine pops the oldest item (FIFO = breadth-first)
// 3. New links go into `discovered` and, if shallow enough, the queue
// 4. `visited` records which discovered URLs have been fetched
//
// Invariants kept by this type:
// - visited ⊆ discovered, and every queued URL is discovered
// - discovered never grows past max_urls
// - nothing is queued deeper than max_depth
//
// Rust concepts:
// - HashSet: To track visited URLs (O(1) lookup)
// - VecDeque: Double-ended queue for breadth-first crawling
// =============================================================================

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use url::Url;

use super::normalize::resolve_seed;
use crate::error::CrawlError;

// Represents a page in the crawl queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlItem {
    pub url: String,
    pub depth: usize, // How many link hops from the seed
}

/// One discovered URL and the depth it was found at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredPage {
    pub url: String,
    pub depth: usize,
}

/// Where a job's URL list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    Sitemap,
    Crawl,
}

/// Final output of a job, handed to downstream consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub seed: String,
    pub base_domain: String,
    pub source: DiscoverySource,
    pub pages: Vec<DiscoveredPage>,
    pub visited: usize,
}

impl CrawlResult {
    /// Discovered URLs in discovery order
    pub fn urls(&self) -> Vec<String> {
        self.pages.iter().map(|p| p.url.clone()).collect()
    }

    pub fn depth_of(&self, url: &str) -> Option<usize> {
        self.pages.iter().find(|p| p.url == url).map(|p| p.depth)
    }
}

#[derive(Debug)]
pub struct CrawlJob {
    seed_url: Url,
    base_domain: String,
    max_depth: usize,
    max_urls: usize,
    disallowed_paths: Vec<String>,
    discovered: HashSet<String>,
    // Same URLs as `discovered`, in the order they were found
    pages: Vec<DiscoveredPage>,
    visited: HashSet<String>,
    queue: VecDeque<CrawlItem>,
}

impl CrawlJob {
    // Creates a job for `raw_seed`
    //
    // Fails only if the seed cannot be turned into an http(s) URL with a host.
    pub fn new(raw_seed: &str, max_depth: usize, max_urls: usize) -> Result<Self, CrawlError> {
        let seed_url = resolve_seed(raw_seed)?;
        let base_domain = seed_url
            .host_str()
            .ok_or_else(|| CrawlError::InvalidSeed(raw_seed.to_string()))?
            .to_string();

        Ok(Self {
            seed_url,
            base_domain,
            max_depth,
            max_urls,
            disallowed_paths: Vec::new(),
            discovered: HashSet::new(),
            pages: Vec::new(),
            visited: HashSet::new(),
            queue: VecDeque::new(),
        })
    }

    pub fn seed_url(&self) -> &Url {
        &self.seed_url
    }

    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    pub fn disallowed_paths(&self) -> &[String] {
        &self.disallowed_paths
    }

    pub fn add_disallowed(&mut self, paths: impl IntoIterator<Item = String>) {
        self.disallowed_paths.extend(paths);
    }

    pub fn discovered(&self) -> &HashSet<String> {
        &self.discovered
    }

    pub fn discovered_count(&self) -> usize {
        self.discovered.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    pub fn is_full(&self) -> bool {
        self.discovered.len() >= self.max_urls
    }

    // Records a URL as known
    //
    // Returns: true if the URL was new and the budget allowed it
    pub fn discover(&mut self, url: &str, depth: usize) -> bool {
        if self.is_full() || self.discovered.contains(url) {
            return false;
        }
        self.discovered.insert(url.to_string());
        self.pages.push(DiscoveredPage {
            url: url.to_string(),
            depth,
        });
        true
    }

    // Queues an already discovered URL for fetching
    //
    // Returns: false when the depth budget or the invariants forbid it
    pub fn enqueue(&mut self, url: &str, depth: usize) -> bool {
        if depth > self.max_depth || !self.discovered.contains(url) {
            return false;
        }
        self.queue.push_back(CrawlItem {
            url: url.to_string(),
            depth,
        });
        true
    }

    // Puts the seed in the frontier at depth 0
    pub fn seed_frontier(&mut self) {
        let seed = self.seed_url.to_string();
        self.discover(&seed, 0);
        self.enqueue(&seed, 0);
    }

    // Removes the oldest queued item
    pub fn dequeue(&mut self) -> Option<CrawlItem> {
        self.queue.pop_front()
    }

    // True if an item should be fetched; false means skip it
    pub fn should_visit(&self, item: &CrawlItem) -> bool {
        !self.visited.contains(&item.url) && item.depth <= self.max_depth
    }

    pub fn mark_visited(&mut self, url: &str) {
        if self.discovered.contains(url) {
            self.visited.insert(url.to_string());
        }
    }

    /// Every discovered URL, in discovery order
    pub fn snapshot(&self) -> Vec<String> {
        self.pages.iter().map(|p| p.url.clone()).collect()
    }

    pub fn into_result(self, source: DiscoverySource) -> CrawlResult {
        CrawlResult {
            seed: self.seed_url.to_string(),
            base_domain: self.base_domain,
            source,
            visited: self.visited.len(),
            pages: self.pages,
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why keep both `discovered` and `pages`?
//    - HashSet answers "have we seen this URL?" in O(1)
//    - Vec remembers the order URLs were found in and their depth
//    - Both are updated together in discover(), never separately
//
// 2. Why are the fields private?
//    - Callers can only change the job through discover/enqueue/mark_visited
//    - That is what keeps visited ⊆ discovered true at all times
//
// 3. What does into_result(self) mean?
//    - `self` by value consumes the job
//    - The sets are moved into the result instead of cloned
// -----------------------------------------------------------------------------
