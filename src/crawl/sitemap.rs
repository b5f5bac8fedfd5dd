// src/crawl/sitemap.rs
// =============================================================================
// Fetches /sitemap.xml and collects the page URLs it lists.
//
// When this returns anything, the engine trusts the sitemap and skips
// manual crawling altogether. There is no reconciliation with a crawl, so a
// stale sitemap hides newer pages.
//
// Like robots.txt, a missing or broken sitemap is not an error: we return
// an empty list and the engine falls back to crawling.
// =============================================================================

use std::collections::HashSet;
use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use url::Url;

use super::normalize::{is_same_domain, normalize_url};
use super::policy::should_skip;
use crate::error::CrawlError;

// Fetches the sitemap and returns crawlable same-domain URLs
//
// Parameters:
//   base: any URL on the site
//   base_domain: hostname the URLs must match
//   disallowed_paths: robots.txt rules
//   max_urls: cap on the returned list
pub async fn fetch_sitemap(
    client: &Client,
    base: &Url,
    base_domain: &str,
    disallowed_paths: &[String],
    max_urls: usize,
    timeout: Duration,
) -> Vec<String> {
    let xml = match fetch_sitemap_xml(client, base, timeout).await {
        Ok(xml) => xml,
        Err(e) => {
            tracing::debug!(site = %base, error = %e, "sitemap.xml unavailable");
            return Vec::new();
        }
    };

    let Some(locs) = parse_sitemap_locs(&xml) else {
        tracing::debug!(site = %base, "sitemap.xml is not valid XML");
        return Vec::new();
    };

    filter_sitemap_urls(locs, base, base_domain, disallowed_paths, max_urls)
}

async fn fetch_sitemap_xml(client: &Client, base: &Url, timeout: Duration) -> Result<String, CrawlError> {
    let Ok(sitemap_url) = base.join("/sitemap.xml") else {
        return Err(CrawlError::InvalidSeed(base.to_string()));
    };

    let response = client
        .get(sitemap_url)
        .header(reqwest::header::ACCEPT, "application/xml, text/xml")
        .timeout(timeout)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(CrawlError::Status(response.status().as_u16()));
    }

    // Some servers answer unknown paths with their HTML home page
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_lowercase();
    if content_type.contains("html") {
        return Err(CrawlError::NotHtml(content_type));
    }

    Ok(response.text().await?)
}

// Extracts the text of every <loc> element
//
// Returns None when the document is not well-formed XML or contains no
// elements at all.
pub fn parse_sitemap_locs(xml: &str) -> Option<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut locs = Vec::new();
    let mut saw_element = false;
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                saw_element = true;
                if e.local_name().as_ref() == b"loc" {
                    current = Some(String::new());
                }
            }
            Ok(Event::Empty(_)) => saw_element = true,
            Ok(Event::Text(text)) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&text.unescape().ok()?);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"loc" {
                    if let Some(loc) = current.take() {
                        let loc = loc.trim();
                        if !loc.is_empty() {
                            locs.push(loc.to_string());
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return None,
        }
    }

    saw_element.then_some(locs)
}

fn filter_sitemap_urls(
    locs: Vec<String>,
    base: &Url,
    base_domain: &str,
    disallowed_paths: &[String],
    max_urls: usize,
) -> Vec<String> {
    let mut seen = HashSet::new();

    locs.into_iter()
        .filter_map(|loc| normalize_url(&loc, base.as_str()))
        .filter(|url| is_same_domain(url, base_domain))
        .filter(|url| !should_skip(url, disallowed_paths))
        .filter(|url| seen.insert(url.clone()))
        .take(max_urls)
        .collect()
}
