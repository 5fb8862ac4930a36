//! Crawl orchestrator
//!
//! The engine owns the spawn loop: on a fixed tick it starts at most one new
//! scraper while the in-flight count sits below the ceiling, then routes each
//! scraper's results. Accepted links go through the filter pipeline into the
//! visited set and the frontier; emails are deduplicated process-wide and
//! surfaced on first sight.
//!
//! Spawning is tick-driven on purpose: one scraper per tick caps the growth
//! rate of new work no matter how many links a page yields.

use crate::config::CrawlerConfig;
use crate::filter::UrlFilter;
use crate::frontier::Frontier;
use crate::scraper::{PageFetcher, ScrapeError, ScrapeState, Scraper};
use crate::store::VisitedSet;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Bounded-concurrency crawl orchestrator
pub struct Engine {
    config: CrawlerConfig,
    frontier: Arc<Frontier>,
    visited: Arc<dyn VisitedSet>,
    filter: Arc<UrlFilter>,
    fetcher: Arc<dyn PageFetcher>,

    /// Scrapers currently between spawn and their completion callback
    in_flight: Arc<AtomicUsize>,

    /// Process-wide set of email addresses already surfaced
    seen_emails: Arc<Mutex<HashSet<String>>>,
}

impl Engine {
    /// Creates an engine over explicitly constructed collaborators
    pub fn new(
        config: CrawlerConfig,
        frontier: Arc<Frontier>,
        visited: Arc<dyn VisitedSet>,
        filter: Arc<UrlFilter>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        Self {
            config,
            frontier,
            visited,
            filter,
            fetcher,
            in_flight: Arc::new(AtomicUsize::new(0)),
            seen_emails: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Marks the seed URLs visited and enqueues them.
    ///
    /// Insert-then-enqueue is the same ordering used for discovered links,
    /// so a seed rediscovered on a page is never scheduled twice.
    pub fn seed(&self, seeds: &[Url]) {
        for url in seeds {
            if let Err(e) = self.visited.add(url.as_str()) {
                tracing::warn!(url = %url, error = %e, "failed to mark seed visited");
            }
            self.frontier.enqueue(url);
            tracing::info!(url = %url, "seeded frontier");
        }
    }

    /// Runs the spawn loop.
    ///
    /// Returns once the crawl has been idle (no in-flight scrapers, nothing
    /// in the frontier) for `idle_shutdown_ticks` consecutive ticks. With
    /// that setting at zero the loop runs until externally stopped.
    pub async fn run(&self) {
        tracing::info!(
            max_in_flight = self.config.max_in_flight,
            interval_ms = self.config.spawn_interval_ms,
            "starting crawl loop"
        );

        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.spawn_interval_ms));
        let mut idle_ticks: u32 = 0;

        loop {
            ticker.tick().await;

            let mut spawned_work = false;
            if self.in_flight.load(Ordering::SeqCst) < self.config.max_in_flight {
                spawned_work = self.spawn_one();
            }

            let busy = spawned_work
                || self.in_flight.load(Ordering::SeqCst) > 0
                || self.frontier.count() > 0;

            if busy {
                idle_ticks = 0;
            } else {
                idle_ticks += 1;
                if self.config.idle_shutdown_ticks != 0
                    && idle_ticks >= self.config.idle_shutdown_ticks
                {
                    tracing::info!(idle_ticks, "frontier drained, stopping crawl loop");
                    return;
                }
            }
        }
    }

    /// Number of scrapers currently in flight
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Number of distinct email addresses surfaced so far
    pub fn emails_seen(&self) -> usize {
        self.seen_emails.lock().unwrap().len()
    }

    /// Spawns one scraper and wires its callbacks.
    ///
    /// Returns whether the scraper actually bound a URL; a `false` means the
    /// frontier had nothing this round (possibly just a lost refill race) and
    /// the caller should simply try again next tick.
    fn spawn_one(&self) -> bool {
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        let scraper = Scraper::new(self.frontier.as_ref(), Arc::clone(&self.fetcher));
        let bound_url = scraper.state() == ScrapeState::Idle;
        let source = scraper.source();

        // The links path owns the in-flight decrement: its done/error pair
        // fires exactly once per scraper.
        let filter = Arc::clone(&self.filter);
        let visited = Arc::clone(&self.visited);
        let frontier = Arc::clone(&self.frontier);
        let in_flight = Arc::clone(&self.in_flight);
        let in_flight_err = Arc::clone(&self.in_flight);
        let link_source = source.clone();
        let error_source = source.clone();

        scraper.request_links(
            move |links| {
                for link in links.iter() {
                    handle_link(link, &link_source, &filter, &visited, &frontier);
                }
                in_flight.fetch_sub(1, Ordering::SeqCst);
            },
            move |error| {
                match error.as_ref() {
                    ScrapeError::NoUrl => {
                        tracing::trace!("no URL available this tick");
                    }
                    other => {
                        tracing::warn!(source = %error_source, error = %other, "scrape failed");
                    }
                }
                in_flight_err.fetch_sub(1, Ordering::SeqCst);
            },
        );

        let seen_emails = Arc::clone(&self.seen_emails);
        let email_source = source;
        scraper.request_emails(
            move |emails| {
                let mut seen = seen_emails.lock().unwrap();
                for email in emails.iter() {
                    // Only the first sighting of an address is surfaced
                    if seen.insert(email.as_str().to_string()) {
                        tracing::info!(email = %email, source = %email_source, "discovered email");
                    }
                }
            },
            // The links error path already logged this failure
            |_| {},
        );

        bound_url
    }
}

/// Routes one discovered link: rejected links are logged with the rejecting
/// rule's name; accepted links enter the visited set first and the frontier
/// second.
fn handle_link(
    link: &Url,
    source: &str,
    filter: &UrlFilter,
    visited: &Arc<dyn VisitedSet>,
    frontier: &Frontier,
) {
    match filter.rejecting_rule(link) {
        Some(rule) => {
            tracing::debug!(url = %link, rule, source, "link rejected");
        }
        None => {
            // Visited before enqueued: concurrent rediscovery of this URL
            // now fails the visited filter and cannot enqueue it twice
            if let Err(e) = visited.add(link.as_str()) {
                tracing::warn!(url = %link, error = %e, "failed to mark link visited");
            }
            frontier.enqueue(link);
            tracing::info!(url = %link, source, "discovered link");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::rules;
    use crate::scraper::FetchError;
    use crate::store::{MemoryUrlQueue, MemoryVisitedSet};
    use async_trait::async_trait;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn test_config() -> CrawlerConfig {
        CrawlerConfig {
            max_in_flight: 4,
            spawn_interval_ms: 5,
            refill_batch: 250,
            idle_shutdown_ticks: 10,
        }
    }

    /// Serves an empty page for every URL
    struct EmptyPageFetcher;

    #[async_trait]
    impl PageFetcher for EmptyPageFetcher {
        async fn fetch(&self, _url: &Url) -> Result<String, FetchError> {
            Ok(String::new())
        }
    }

    /// Never completes; keeps scrapers in flight forever
    struct HangingFetcher;

    #[async_trait]
    impl PageFetcher for HangingFetcher {
        async fn fetch(&self, _url: &Url) -> Result<String, FetchError> {
            std::future::pending().await
        }
    }

    fn build_engine(config: CrawlerConfig, fetcher: Arc<dyn PageFetcher>) -> Engine {
        let visited: Arc<dyn VisitedSet> = Arc::new(MemoryVisitedSet::new());
        let mut filter = UrlFilter::new();
        filter.add_rule("reject-visited", rules::reject_visited(Arc::clone(&visited)));
        Engine::new(
            config,
            Arc::new(Frontier::new(Arc::new(MemoryUrlQueue::new()))),
            visited,
            Arc::new(filter),
            fetcher,
        )
    }

    #[tokio::test]
    async fn test_run_stops_when_idle() {
        let engine = build_engine(test_config(), Arc::new(EmptyPageFetcher));
        engine.seed(&[url("http://example.com/")]);

        tokio::time::timeout(Duration::from_secs(5), engine.run())
            .await
            .expect("engine never went idle");
        assert_eq!(engine.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_ceiling() {
        let mut config = test_config();
        config.max_in_flight = 2;
        let engine = Arc::new(build_engine(config, Arc::new(HangingFetcher)));
        engine.seed(&[
            url("http://a.com/"),
            url("http://b.com/"),
            url("http://c.com/"),
            url("http://d.com/"),
        ]);

        let runner = Arc::clone(&engine);
        let handle = tokio::spawn(async move { runner.run().await });

        // Give the spawn loop time to saturate
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(engine.in_flight(), 2);

        handle.abort();
    }

    #[tokio::test]
    async fn test_seed_marks_visited_before_enqueue() {
        let visited: Arc<dyn VisitedSet> = Arc::new(MemoryVisitedSet::new());
        let engine = Engine::new(
            test_config(),
            Arc::new(Frontier::new(Arc::new(MemoryUrlQueue::new()))),
            Arc::clone(&visited),
            Arc::new(UrlFilter::new()),
            Arc::new(EmptyPageFetcher),
        );

        engine.seed(&[url("http://example.com/")]);
        assert!(visited.contains("http://example.com/").unwrap());
    }
}
