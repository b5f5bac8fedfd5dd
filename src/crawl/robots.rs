// src/crawl/robots.rs
// =============================================================================
// Fetches /robots.txt and turns it into a list of disallowed path prefixes.
//
// A missing or broken robots.txt means "no restrictions", so these functions
// never fail: every error path returns an empty list.
//
// Parsing rules:
// - `User-agent:` lines open a group; consecutive agent lines share one group
// - a group applies if its agent is `*` or matches our agent token
//   (case-insensitive substring, either direction)
// - only `Disallow:` lines inside an applicable group are collected
// - everything else (Allow, Sitemap, Crawl-delay, junk) is ignored
// =============================================================================

use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::error::CrawlError;

// What the robots.txt request turned into
//
// All three outcomes mean "crawl", the variants only tell the log apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotsFetch {
    // robots.txt was read; the list may still be empty
    Rules(Vec<String>),
    // The server answered with a non-2xx status
    NotFound,
    // Network error or timeout
    Unreachable,
}

impl RobotsFetch {
    pub fn into_rules(self) -> Vec<String> {
        match self {
            RobotsFetch::Rules(rules) => rules,
            RobotsFetch::NotFound | RobotsFetch::Unreachable => Vec::new(),
        }
    }
}

// Fetches and parses robots.txt for the site of `base`
//
// Parameters:
//   client: shared HTTP client of the job
//   base: any URL on the site (only scheme/host/port are used)
//   agent: lowercase product token of our User-Agent
//   timeout: request timeout
pub async fn fetch_robots(client: &Client, base: &Url, agent: &str, timeout: Duration) -> RobotsFetch {
    match fetch_robots_txt(client, base, timeout).await {
        Ok(text) => RobotsFetch::Rules(parse_robots(&text, agent)),
        Err(CrawlError::Status(status)) => {
            tracing::debug!(site = %base, status, "no robots.txt");
            RobotsFetch::NotFound
        }
        Err(e) => {
            tracing::debug!(site = %base, error = %e, "robots.txt unavailable");
            RobotsFetch::Unreachable
        }
    }
}

// Same as fetch_robots, flattened to the disallowed prefixes
pub async fn fetch_robots_policy(
    client: &Client,
    base: &Url,
    agent: &str,
    timeout: Duration,
) -> Vec<String> {
    fetch_robots(client, base, agent, timeout).await.into_rules()
}

async fn fetch_robots_txt(client: &Client, base: &Url, timeout: Duration) -> Result<String, CrawlError> {
    let Ok(robots_url) = base.join("/robots.txt") else {
        return Err(CrawlError::InvalidSeed(base.to_string()));
    };

    let response = client
        .get(robots_url)
        .header(reqwest::header::ACCEPT, "text/plain")
        .timeout(timeout)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(CrawlError::Status(response.status().as_u16()));
    }

    Ok(response.text().await?)
}

// Parses robots.txt content into Disallow prefixes that apply to `agent`
//
// Example:
//   User-agent: *
//   Disallow: /private
//   -> ["/private"]
pub fn parse_robots(text: &str, agent: &str) -> Vec<String> {
    let agent = agent.to_lowercase();
    let mut disallowed = Vec::new();

    // Rules that appear before any User-agent line are honored
    let mut applies = true;
    // True while we are reading a run of User-agent lines
    let mut in_agent_run = false;

    for raw_line in text.lines() {
        // Strip comments, then whitespace
        let line = raw_line.split('#').next().unwrap_or_default().trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                let matches = agent_matches(value, &agent);
                applies = if in_agent_run { applies || matches } else { matches };
                in_agent_run = true;
            }
            "disallow" => {
                in_agent_run = false;
                if applies && !value.is_empty() {
                    disallowed.push(value.to_string());
                }
            }
            _ => {
                in_agent_run = false;
            }
        }
    }

    disallowed
}

fn agent_matches(group_agent: &str, our_agent: &str) -> bool {
    let group_agent = group_agent.to_lowercase();
    if group_agent == "*" {
        return true;
    }
    if group_agent.is_empty() || our_agent.is_empty() {
        return false;
    }
    group_agent.contains(our_agent) || our_agent.contains(&group_agent)
}
