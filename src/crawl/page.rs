// src/crawl/page.rs
// =============================================================================
// Fetches a single page and extracts the links worth crawling next.
//
// Every failure (timeout, DNS, non-2xx, non-HTML body) is treated the same:
// the page simply yields zero links. One dead page never stops a crawl.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
//
// Rust concepts:
// - HashSet: Dedupes links found more than once on the same page
// - Iterators + filter: Each link passes a chain of checks
// =============================================================================

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};

use super::normalize::{is_same_domain, normalize_url};
use super::policy::should_skip;
use crate::error::CrawlError;

// Fetches `url` and returns the new same-domain links it contains
//
// Parameters:
//   url: normalized URL of the page
//   timeout: per-page request timeout
//   base_domain: hostname links must share
//   disallowed_paths: robots.txt rules
//   discovered: URLs the job already knows about
//
// Returns: newly found links in document order (empty on any failure)
pub async fn fetch_and_extract_links(
    client: &Client,
    url: &str,
    timeout: Duration,
    base_domain: &str,
    disallowed_paths: &[String],
    discovered: &HashSet<String>,
) -> Vec<String> {
    match fetch_html(client, url, timeout).await {
        Ok(html) => extract_links(&html, url, base_domain, disallowed_paths, discovered),
        Err(e) => {
            tracing::debug!(%url, error = %e, "page skipped");
            Vec::new()
        }
    }
}

// Fetches a page and returns its body if it is HTML
async fn fetch_html(client: &Client, url: &str, timeout: Duration) -> Result<String, CrawlError> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/html")
        .timeout(timeout)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(CrawlError::Status(response.status().as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.to_lowercase().contains("text/html") {
        return Err(CrawlError::NotHtml(content_type));
    }

    Ok(response.text().await?)
}

// Extracts crawlable links from HTML content
//
// Each href must: normalize cleanly, stay on `base_domain`, pass the skip
// policy and not already be in `discovered`.
//
// Example:
//   html = "<a href='/docs'>Docs</a><a href='mailto:x@y.z'>Mail</a>"
//   page_url = "https://example.com"
//   result = ["https://example.com/docs"]
pub fn extract_links(
    html: &str,
    page_url: &str,
    base_domain: &str,
    disallowed_paths: &[String],
    discovered: &HashSet<String>,
) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| normalize_url(href, page_url))
        .filter(|link| is_same_domain(link, base_domain))
        .filter(|link| !should_skip(link, disallowed_paths))
        .filter(|link| !discovered.contains(link))
        .filter(|link| seen.insert(link.clone()))
        .collect()
}
