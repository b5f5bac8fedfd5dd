// src/crawl/engine.rs
// =============================================================================
// The crawl engine: one state machine shared by every transport.
//
//   Init -> FetchingRobots -> FetchingSitemap -> SitemapComplete
//                                             -> Crawling -> Complete
//   Init -> Failed (only for an unusable seed URL)
//
// The engine never talks to a UI or an HTTP response directly. It publishes
// CrawlEvents to an EventSink and watches a CancellationToken, so the same
// code runs behind the CLI, an in-process session and the SSE endpoint.
//
// Crawling is sequential: one page is fetched and parsed before the next
// is dequeued. Pages are paced with a fixed delay.
//
// Rust concepts:
// - Generics with trait bounds: `run<S: EventSink>` works with any sink
// - tokio::select!: Races a network call against cancellation
// - ? operator: Cancellation bubbles out of every await point
// =============================================================================

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio_util::sync::CancellationToken;

use super::events::{CrawlEvent, EventSink};
use super::normalize::display_path;
use super::page::fetch_and_extract_links;
use super::queue::{CrawlJob, CrawlResult, DiscoverySource};
use super::robots::{fetch_robots, RobotsFetch};
use super::sitemap::fetch_sitemap;
use crate::config::CrawlConfig;
use crate::error::CrawlError;

// A configured crawler
//
// Cheap to clone: reqwest::Client is reference counted internally.
// Each call to `run` builds a fresh CrawlJob, so concurrent runs share
// nothing but the connection pool.
#[derive(Debug, Clone)]
pub struct Crawler {
    client: Client,
    config: CrawlConfig,
}

impl Crawler {
    // Builds the HTTP client for this crawler
    pub fn new(config: CrawlConfig) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    // Runs one crawl job to completion
    //
    // Parameters:
    //   seed: the user-supplied start URL ("example.com" is accepted)
    //   sink: where events are published
    //   cancel: stops the job at the next await point once triggered
    //
    // Returns:
    //   Ok(result) after the terminal Urls{complete:true} event
    //   Err(InvalidSeed) after the single Error event
    //   Err(Cancelled) if the token fired or the sink closed
    pub async fn run<S: EventSink>(
        &self,
        seed: &str,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> Result<CrawlResult, CrawlError> {
        // --- Init ---------------------------------------------------------
        let mut job = match CrawlJob::new(seed, self.config.max_depth, self.config.max_urls) {
            Ok(job) => job,
            Err(e) => {
                tracing::warn!(%seed, error = %e, "crawl rejected");
                emit(sink, cancel, CrawlEvent::error(e.to_string())).await?;
                return Err(e);
            }
        };

        tracing::info!(seed = %job.seed_url(), "crawl started");
        emit(sink, cancel, CrawlEvent::log(format!("Starting crawl of {}", job.base_domain()))).await?;

        // --- FetchingRobots -----------------------------------------------
        emit(sink, cancel, CrawlEvent::log("Fetching robots.txt...")).await?;
        let robots = until_cancelled(
            cancel,
            fetch_robots(
                &self.client,
                job.seed_url(),
                &self.config.robots_agent(),
                self.config.fetch_timeout,
            ),
        )
        .await?;

        let message = match &robots {
            RobotsFetch::Rules(rules) if !rules.is_empty() => {
                format!("Respecting {} robots.txt rules", rules.len())
            }
            RobotsFetch::Rules(_) => "No robots.txt rules found (using default rules)".to_string(),
            RobotsFetch::NotFound => "No robots.txt found (using default rules)".to_string(),
            RobotsFetch::Unreachable => "Could not fetch robots.txt (using default rules)".to_string(),
        };
        job.add_disallowed(robots.into_rules());
        emit(sink, cancel, CrawlEvent::log(message)).await?;

        // --- FetchingSitemap ----------------------------------------------
        emit(sink, cancel, CrawlEvent::log("Checking for sitemap.xml...")).await?;
        let sitemap_urls = until_cancelled(
            cancel,
            fetch_sitemap(
                &self.client,
                job.seed_url(),
                job.base_domain(),
                job.disallowed_paths(),
                self.config.max_urls,
                self.config.fetch_timeout,
            ),
        )
        .await?;

        if !sitemap_urls.is_empty() {
            let message = format!("Found sitemap.xml – adding {} URLs", sitemap_urls.len());
            emit(sink, cancel, CrawlEvent::log(message)).await?;
            for url in &sitemap_urls {
                job.discover(url, 0);
            }

            let urls = job.snapshot();
            let total = urls.len();
            emit(sink, cancel, CrawlEvent::Urls { urls, complete: true }).await?;
            let message = format!("Crawling complete: {} URLs found from sitemap", total);
            emit(sink, cancel, CrawlEvent::log(message)).await?;

            tracing::info!(total, "crawl finished from sitemap");
            return Ok(job.into_result(DiscoverySource::Sitemap));
        }

        // --- Crawling -----------------------------------------------------
        emit(sink, cancel, CrawlEvent::log("No sitemap found, crawling manually...")).await?;
        job.seed_frontier();

        let started = Instant::now();
        let mut processed = 0usize;

        loop {
            if cancel.is_cancelled() {
                return Err(CrawlError::Cancelled);
            }
            if job.is_full() {
                break;
            }
            let Some(item) = job.dequeue() else {
                break;
            };

            // Cycle avoidance and depth cutoff
            if !job.should_visit(&item) {
                continue;
            }
            job.mark_visited(&item.url);
            processed += 1;

            emit(sink, cancel, CrawlEvent::log(format!("Crawling {}", display_path(&item.url)))).await?;

            if !self.config.request_delay.is_zero() {
                until_cancelled(cancel, tokio::time::sleep(self.config.request_delay)).await?;
            }

            let links = until_cancelled(
                cancel,
                fetch_and_extract_links(
                    &self.client,
                    &item.url,
                    self.config.page_timeout,
                    job.base_domain(),
                    job.disallowed_paths(),
                    job.discovered(),
                ),
            )
            .await?;

            let child_depth = item.depth + 1;
            for link in links {
                // Also false once the URL budget is used up
                if !job.discover(&link, child_depth) {
                    continue;
                }
                emit(sink, cancel, CrawlEvent::log(format!("Discovered → {}", display_path(&link)))).await?;

                if item.depth < self.config.max_depth {
                    job.enqueue(&link, child_depth);
                }

                emit(sink, cancel, CrawlEvent::Urls { urls: job.snapshot(), complete: false }).await?;
            }

            if self.config.progress_every > 0 && processed % self.config.progress_every == 0 {
                let event = CrawlEvent::Progress {
                    discovered: job.discovered_count(),
                    visited: job.visited_count(),
                    queued: job.queued_count(),
                    eta: estimate_eta(job.queued_count(), processed, started.elapsed()),
                };
                emit(sink, cancel, event).await?;
            }
        }

        // --- Complete -----------------------------------------------------
        let urls = job.snapshot();
        let total = urls.len();
        emit(sink, cancel, CrawlEvent::Urls { urls, complete: true }).await?;
        emit(sink, cancel, CrawlEvent::log(format!("Crawling complete: {} URLs found", total))).await?;

        tracing::info!(total, visited = job.visited_count(), "crawl finished");
        Ok(job.into_result(DiscoverySource::Crawl))
    }
}

// Seconds left at the current throughput, rounded up
//
// 0 when nothing is queued or no throughput can be measured yet.
pub fn estimate_eta(remaining: usize, processed: usize, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if remaining == 0 || processed == 0 || secs <= 0.0 {
        return 0;
    }
    let rate = processed as f64 / secs;
    (remaining as f64 / rate).ceil() as u64
}

// Publishes one event, stopping the job if the consumer is gone
async fn emit<S: EventSink>(
    sink: &mut S,
    cancel: &CancellationToken,
    event: CrawlEvent,
) -> Result<(), CrawlError> {
    if cancel.is_cancelled() {
        return Err(CrawlError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CrawlError::Cancelled),
        sent = sink.emit(event) => match sent {
            Ok(()) => Ok(()),
            Err(_) => {
                cancel.cancel();
                Err(CrawlError::Cancelled)
            }
        },
    }
}

async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output, CrawlError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CrawlError::Cancelled),
        out = fut => Ok(out),
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does `biased;` do in tokio::select!?
//    - Branches are polled top to bottom instead of in random order
//    - Cancellation is checked before the work future every time
//
// 2. Why does emit() return a Result?
//    - A closed sink means nobody is listening anymore
//    - Returning Err(Cancelled) lets `?` unwind the whole crawl loop
//
// 3. Why `&mut S` instead of `S`?
//    - The caller keeps ownership of its sink
//    - A Vec sink can be inspected after run() returns
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Server, ServerGuard};
    use std::collections::HashSet;
    use url::Url;

    fn test_crawler() -> Crawler {
        let config = CrawlConfig::default()
            .with_request_delay(Duration::ZERO)
            .with_page_timeout(Duration::from_secs(5))
            .with_fetch_timeout(Duration::from_secs(5));
        Crawler::new(config).unwrap()
    }

    // mockito answers unmatched paths with 501, so robots.txt and
    // sitemap.xml both count as missing
    async fn site_without_policies() -> ServerGuard {
        Server::new_async().await
    }

    async fn html_page(server: &mut ServerGuard, path: &str, body: &str) -> mockito::Mock {
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(body)
            .create_async()
            .await
    }

    fn url_events(events: &[CrawlEvent]) -> Vec<(Vec<String>, bool)> {
        events
            .iter()
            .filter_map(|e| match e {
                CrawlEvent::Urls { urls, complete } => Some((urls.clone(), *complete)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_scenario_single_new_link() {
        let mut server = site_without_policies().await;
        let _root = html_page(
            &mut server,
            "/",
            r#"<a href="/about">About</a>
               <a href="/about">About</a>
               <a href="mailto:x@y.com">Mail</a>
               <a href="https://other.com/x">Other</a>"#,
        )
        .await;

        let mut events = Vec::new();
        let result = test_crawler()
            .run(&server.url(), &mut events, &CancellationToken::new())
            .await
            .unwrap();

        let about = format!("{}/about", server.url());
        assert_eq!(result.urls(), vec![format!("{}/", server.url()), about.clone()]);
        assert_eq!(result.depth_of(&about), Some(1));
        assert_eq!(result.source, DiscoverySource::Crawl);

        let discovery_logs = events
            .iter()
            .filter(|e| matches!(e, CrawlEvent::Log { message } if message.starts_with("Discovered")))
            .count();
        assert_eq!(discovery_logs, 1);
        assert!(events.contains(&CrawlEvent::log("No robots.txt found (using default rules)")));

        let urls = url_events(&events);
        assert_eq!(urls.last().map(|(_, complete)| *complete), Some(true));
        assert_eq!(urls.iter().filter(|(_, complete)| *complete).count(), 1);
        assert!(!events.iter().any(|e| matches!(e, CrawlEvent::Error { .. })));
    }

    #[tokio::test]
    async fn test_urls_events_are_monotonic_and_same_domain() {
        let mut server = site_without_policies().await;
        let _root = html_page(&mut server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
        let _a = html_page(&mut server, "/a", r#"<a href="/c">C</a><a href="https://elsewhere.org/">X</a>"#).await;
        let _b = html_page(&mut server, "/b", r#"<a href="/a">A</a><a href="/d">D</a>"#).await;

        let mut events = Vec::new();
        test_crawler()
            .run(&server.url(), &mut events, &CancellationToken::new())
            .await
            .unwrap();

        let mut previous: HashSet<String> = HashSet::new();
        for (urls, _) in url_events(&events) {
            let current: HashSet<String> = urls.iter().cloned().collect();
            assert!(previous.is_subset(&current));
            for url in &urls {
                assert_eq!(Url::parse(url).unwrap().host_str(), Some("127.0.0.1"));
            }
            previous = current;
        }
        assert_eq!(previous.len(), 5);
    }

    #[tokio::test]
    async fn test_breadth_first_order() {
        let mut server = site_without_policies().await;
        let _root = html_page(&mut server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
        let _a = html_page(&mut server, "/a", r#"<a href="/a/deep">Deep</a>"#).await;
        let _b = html_page(&mut server, "/b", "<p>leaf</p>").await;

        let mut events = Vec::new();
        test_crawler()
            .run(&server.url(), &mut events, &CancellationToken::new())
            .await
            .unwrap();

        let crawled: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                CrawlEvent::Log { message } => message.strip_prefix("Crawling /").map(|p| format!("/{}", p)),
                _ => None,
            })
            .collect();
        assert_eq!(crawled, vec!["/", "/a", "/b", "/a/deep"]);
    }

    #[tokio::test]
    async fn test_sitemap_short_circuit() {
        let mut server = Server::new_async().await;
        let _robots = server.mock("GET", "/robots.txt").with_status(404).create_async().await;
        let sitemap = format!(
            "<urlset><url><loc>{0}/one</loc></url><url><loc>{0}/two</loc></url>\
             <url><loc>https://other.com/three</loc></url></urlset>",
            server.url()
        );
        let _sitemap = server
            .mock("GET", "/sitemap.xml")
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body(sitemap)
            .create_async()
            .await;
        let root = server.mock("GET", "/").expect(0).create_async().await;

        let mut events = Vec::new();
        let result = test_crawler()
            .run(&server.url(), &mut events, &CancellationToken::new())
            .await
            .unwrap();

        let urls = url_events(&events);
        assert_eq!(urls.len(), 1);
        assert_eq!(
            urls[0],
            (vec![format!("{}/one", server.url()), format!("{}/two", server.url())], true)
        );
        assert_eq!(result.source, DiscoverySource::Sitemap);
        root.assert_async().await;
    }

    #[tokio::test]
    async fn test_robots_rules_are_respected() {
        let mut server = Server::new_async().await;
        let _robots = server
            .mock("GET", "/robots.txt")
            .with_status(200)
            .with_body("User-agent: *\nDisallow: /private\n")
            .create_async()
            .await;
        let _root = html_page(
            &mut server,
            "/",
            r#"<a href="/private/page">Secret</a><a href="/public">Public</a>"#,
        )
        .await;
        let private = server.mock("GET", "/private/page").expect(0).create_async().await;

        let mut events = Vec::new();
        test_crawler()
            .run(&server.url(), &mut events, &CancellationToken::new())
            .await
            .unwrap();

        for (urls, _) in url_events(&events) {
            assert!(urls.iter().all(|u| !u.contains("/private")));
        }
        assert!(events.contains(&CrawlEvent::log("Respecting 1 robots.txt rules")));
        private.assert_async().await;
    }

    #[tokio::test]
    async fn test_url_budget() {
        let mut server = site_without_policies().await;
        let links: String = (0..10).map(|i| format!(r#"<a href="/p{}">P</a>"#, i)).collect();
        let _root = html_page(&mut server, "/", &links).await;

        let crawler = Crawler::new(
            CrawlConfig::default()
                .with_request_delay(Duration::ZERO)
                .with_max_urls(4),
        )
        .unwrap();

        let mut events = Vec::new();
        let result = crawler
            .run(&server.url(), &mut events, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.pages.len(), 4);
        assert_eq!(result.visited, 1);
        for (urls, _) in url_events(&events) {
            assert!(urls.len() <= 4);
        }
    }

    #[tokio::test]
    async fn test_depth_budget() {
        let mut server = site_without_policies().await;
        let _root = html_page(&mut server, "/", r#"<a href="/a">A</a>"#).await;
        let _a = html_page(&mut server, "/a", r#"<a href="/b">B</a>"#).await;
        let b = server.mock("GET", "/b").expect(0).create_async().await;

        let crawler = Crawler::new(
            CrawlConfig::default()
                .with_request_delay(Duration::ZERO)
                .with_max_depth(1),
        )
        .unwrap();

        let mut events = Vec::new();
        let result = crawler
            .run(&server.url(), &mut events, &CancellationToken::new())
            .await
            .unwrap();

        // /b is discovered at depth 2 but never fetched
        assert_eq!(result.depth_of(&format!("{}/b", server.url())), Some(2));
        assert_eq!(result.visited, 2);
        b.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_seed_single_error() {
        let mut events = Vec::new();
        let err = test_crawler()
            .run("not a url and no scheme???", &mut events, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, CrawlError::InvalidSeed(_)));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], CrawlEvent::Error { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_job_emits_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut events = Vec::new();
        let err = test_crawler()
            .run("https://example.com", &mut events, &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_closed_sink_stops_crawl() {
        let mut server = site_without_policies().await;
        let links: String = (0..30).map(|i| format!(r#"<a href="/p{}">P</a>"#, i)).collect();
        let _root = html_page(&mut server, "/", &links).await;
        let pages = server
            .mock("GET", mockito::Matcher::Regex(r"^/p\d+$".to_string()))
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<p>leaf</p>")
            .expect_at_most(4)
            .create_async()
            .await;

        let crawler = Crawler::new(
            CrawlConfig::default().with_request_delay(Duration::from_millis(100)),
        )
        .unwrap();
        let (mut tx, mut rx) = tokio::sync::mpsc::channel(256);
        let cancel = CancellationToken::new();
        let job_cancel = cancel.clone();
        let seed = server.url();
        let job = tokio::spawn(async move { crawler.run(&seed, &mut tx, &job_cancel).await });

        while let Some(event) = rx.recv().await {
            if event == CrawlEvent::log("Crawling /p2") {
                break;
            }
        }
        drop(rx);

        let outcome = tokio::time::timeout(Duration::from_secs(5), job).await.unwrap().unwrap();
        assert!(outcome.unwrap_err().is_cancelled());
        assert!(cancel.is_cancelled());

        tokio::time::sleep(Duration::from_millis(500)).await;
        pages.assert_async().await;
    }

    #[tokio::test]
    async fn test_progress_events() {
        let mut server = site_without_policies().await;
        let _root = html_page(&mut server, "/", r#"<a href="/a">A</a>"#).await;
        let _a = html_page(&mut server, "/a", "<p>done</p>").await;

        let crawler = Crawler::new(
            CrawlConfig::default()
                .with_request_delay(Duration::ZERO)
                .with_progress_every(1),
        )
        .unwrap();

        let mut events = Vec::new();
        crawler
            .run(&server.url(), &mut events, &CancellationToken::new())
            .await
            .unwrap();

        let progress: Vec<&CrawlEvent> = events
            .iter()
            .filter(|e| matches!(e, CrawlEvent::Progress { .. }))
            .collect();
        assert_eq!(progress.len(), 2);
        assert_eq!(
            progress[1],
            &CrawlEvent::Progress {
                discovered: 2,
                visited: 2,
                queued: 0,
                eta: 0
            }
        );
    }

    #[test]
    fn test_eta() {
        assert_eq!(estimate_eta(0, 5, Duration::from_secs(10)), 0);
        assert_eq!(estimate_eta(5, 0, Duration::from_secs(10)), 0);
        assert_eq!(estimate_eta(5, 5, Duration::ZERO), 0);
        // 2 pages/sec, 5 left -> 2.5s -> 3
        assert_eq!(estimate_eta(5, 4, Duration::from_secs(2)), 3);
    }
}
