//! End-to-end crawl tests
//!
//! These drive the real engine with the real HTTP fetcher against a wiremock
//! server: seed, fetch, extract, filter, requeue, and email dedup all run as
//! they would in production.

use scuttle::config::CrawlerConfig;
use scuttle::filter::{rules, UrlFilter};
use scuttle::frontier::Frontier;
use scuttle::scraper::HttpFetcher;
use scuttle::store::{MemoryUrlQueue, MemoryVisitedSet, VisitedSet};
use scuttle::Engine;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_crawler_config() -> CrawlerConfig {
    CrawlerConfig {
        max_in_flight: 4,
        spawn_interval_ms: 10,
        refill_batch: 250,
        idle_shutdown_ticks: 25,
    }
}

fn build_engine(
    config: CrawlerConfig,
    visited: Arc<dyn VisitedSet>,
    filter: UrlFilter,
) -> Engine {
    let frontier = Arc::new(Frontier::new(Arc::new(MemoryUrlQueue::new())));
    let fetcher =
        Arc::new(HttpFetcher::with_defaults("scuttle-test/0.1", Duration::from_secs(5)).unwrap());
    Engine::new(config, frontier, visited, Arc::new(filter), fetcher)
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_discovers_filters_and_dedups() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Index: a base href, one absolute link, one relative link, a mailto,
    // a filtered png link, and a duplicated email
    mount_page(
        &server,
        "/",
        format!(
            r#"<html><head><base href="{base}/dir/"></head><body>
            <a href="{base}/abs">absolute</a>
            <a href="rel">relative</a>
            <a href="{base}/image.png">picture</a>
            <a href="mailto:owner@example.com">mail</a>
            <p>dup@example.com and dup@example.com</p>
            </body></html>"#,
        ),
    )
    .await;

    // Linked pages; one repeats the duplicated email, one adds a new one
    mount_page(
        &server,
        "/abs",
        "<html><body>dup@example.com</body></html>".to_string(),
    )
    .await;
    mount_page(
        &server,
        "/dir/rel",
        "<html><body>unique@example.net</body></html>".to_string(),
    )
    .await;

    let visited: Arc<dyn VisitedSet> = Arc::new(MemoryVisitedSet::new());
    let mut filter = UrlFilter::new();
    filter.add_rule("reject-scheme-javascript", rules::reject_scheme("javascript"));
    filter.add_rule("reject-fragment", rules::reject_fragment());
    filter.add_rule("reject-recursive", rules::reject_recursive());
    filter.add_rule("reject-extension-png", rules::reject_extension("png"));
    filter.add_rule("reject-visited", rules::reject_visited(Arc::clone(&visited)));

    let engine = build_engine(test_crawler_config(), Arc::clone(&visited), filter);
    engine.seed(&[Url::parse(&format!("{base}/")).unwrap()]);

    tokio::time::timeout(Duration::from_secs(15), engine.run())
        .await
        .expect("crawl never went idle");

    // Both real links were accepted and scheduled
    assert!(visited.contains(&format!("{base}/abs")).unwrap());
    assert!(visited.contains(&format!("{base}/dir/rel")).unwrap());

    // The png link was rejected by the pipeline, the mailto was never a link
    assert!(!visited.contains(&format!("{base}/image.png")).unwrap());

    // Three distinct addresses: owner@ (from the mailto text), dup@ (seen
    // four times across two pages), unique@
    assert_eq!(engine.emails_seen(), 3);
    assert_eq!(engine.in_flight(), 0);
}

#[tokio::test]
async fn test_failed_fetches_are_dropped_permanently() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        format!(r#"<a href="{base}/gone">dead link</a>"#),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let visited: Arc<dyn VisitedSet> = Arc::new(MemoryVisitedSet::new());
    let mut filter = UrlFilter::new();
    filter.add_rule("reject-visited", rules::reject_visited(Arc::clone(&visited)));

    let engine = build_engine(test_crawler_config(), Arc::clone(&visited), filter);
    engine.seed(&[Url::parse(&format!("{base}/")).unwrap()]);

    // The dead link must not wedge the loop; the engine logs the fetch
    // error, drops the URL, and goes idle
    tokio::time::timeout(Duration::from_secs(15), engine.run())
        .await
        .expect("crawl never went idle");

    assert!(visited.contains(&format!("{base}/gone")).unwrap());
    assert_eq!(engine.in_flight(), 0);
}

#[tokio::test]
async fn test_must_contain_restricts_crawl_to_matching_urls() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        format!(
            r#"<a href="{base}/keep-me">in scope</a>
               <a href="http://elsewhere.invalid/out">out of scope</a>"#
        ),
    )
    .await;
    mount_page(&server, "/keep-me", "<html></html>".to_string()).await;

    let visited: Arc<dyn VisitedSet> = Arc::new(MemoryVisitedSet::new());
    let mut filter = UrlFilter::new();
    filter.add_rule("require-substring", rules::require_substring(&base));
    filter.add_rule("reject-visited", rules::reject_visited(Arc::clone(&visited)));

    let engine = build_engine(test_crawler_config(), Arc::clone(&visited), filter);
    engine.seed(&[Url::parse(&format!("{base}/")).unwrap()]);

    tokio::time::timeout(Duration::from_secs(15), engine.run())
        .await
        .expect("crawl never went idle");

    assert!(visited.contains(&format!("{base}/keep-me")).unwrap());
    assert!(!visited.contains("http://elsewhere.invalid/out").unwrap());
}
