//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small catalogue and drive the real
//! fetcher and coordinator against it end-to-end.

use shelf_harvest::config::{Config, CrawlerConfig, FetchConfig};
use shelf_harvest::crawler::{self, FetchError};
use shelf_harvest::output::{CsvSink, RecordSink};
use shelf_harvest::{Coordinator, HarvestError, ProgressEvent, Rating, TerminationReason};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn create_test_config(server: &MockServer, max_pages: u32, deep: bool) -> Config {
    Config {
        crawler: CrawlerConfig {
            start_url: format!("{}/catalogue/page-1.html", server.uri()),
            max_pages,
            delay: 0.0,
            deep,
        },
        fetch: FetchConfig {
            timeout_secs: 1,
            max_attempts: 3,
            backoff_base_ms: 10,
            backoff_max_ms: 50,
        },
        ..Config::default()
    }
}

/// Builds one listing page with items `first..first + count`
fn listing_page(first: usize, count: usize, next: Option<&str>) -> String {
    let pods: String = (first..first + count)
        .map(|i| {
            format!(
                r#"<li><article class="product_pod">
                    <p class="star-rating Three"></p>
                    <h3><a href="book-{i}_{i}/index.html" title="Book {i}">Book {i}</a></h3>
                    <p class="price_color">£{i}.50</p>
                    <p class="instock availability">In stock ({i} available)</p>
                </article></li>"#
            )
        })
        .collect();
    let pager = next
        .map(|href| format!(r#"<ul class="pager"><li class="next"><a href="{href}">next</a></li></ul>"#))
        .unwrap_or_default();
    format!("<html><body><ol class=\"row\">{pods}</ol>{pager}</body></html>")
}

fn detail_page(upc: &str, category: &str) -> String {
    format!(
        r#"<html><body>
        <ul class="breadcrumb"><li><a href="/">Home</a></li><li><a href="/books">Books</a></li><li><a href="/c">{category}</a></li><li class="active">x</li></ul>
        <div id="product_description"><h2>Product Description</h2></div>
        <p>A description, with a comma.</p>
        <table><tr><th>UPC</th><td>{upc}</td></tr></table>
        </body></html>"#
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_page_without_next_link() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-1.html", listing_page(1, 20, None)).await;

    let config = create_test_config(&server, 1, false);
    let mut coordinator = Coordinator::new(&config, CancellationToken::new()).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.records.len(), 20);
    assert_eq!(report.pages_visited, 1);
    assert_eq!(report.termination, TerminationReason::NoNextPage);
    assert!(report.records.iter().all(|r| r.detail.is_none()));

    let first = &report.records[0];
    assert_eq!(first.title, "Book 1");
    assert_eq!(first.price.display, "£1.50");
    assert_eq!(first.rating, Rating::Stars(3));
    assert_eq!(first.availability, 1);
    assert_eq!(
        first.detail_url,
        format!("{}/catalogue/book-1_1/index.html", server.uri())
    );
    assert_eq!(report.records[19].title, "Book 20");
}

#[tokio::test]
async fn test_follows_pagination_until_max_pages() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-1.html", listing_page(1, 3, Some("page-2.html"))).await;
    mount_page(&server, "/catalogue/page-2.html", listing_page(4, 3, Some("page-3.html"))).await;
    Mock::given(method("GET"))
        .and(path("/catalogue/page-3.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(7, 3, None)))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server, 2, false);
    let report = Coordinator::new(&config, CancellationToken::new())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.termination, TerminationReason::MaxPagesReached);
    let titles: Vec<_> = report.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["Book 1", "Book 2", "Book 3", "Book 4", "Book 5", "Book 6"]);
}

#[tokio::test]
async fn test_last_allowed_page_without_next_is_no_next_page() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-1.html", listing_page(1, 2, Some("page-2.html"))).await;
    mount_page(&server, "/catalogue/page-2.html", listing_page(3, 2, None)).await;

    let config = create_test_config(&server, 2, false);
    let report = Coordinator::new(&config, CancellationToken::new())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.termination, TerminationReason::NoNextPage);
}

#[tokio::test]
async fn test_timeouts_on_first_page_are_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalogue/page-1.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(1, 20, None))
                .set_delay(Duration::from_secs(3)),
        )
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(&server, 3, false);
    let result = Coordinator::new(&config, CancellationToken::new())
        .unwrap()
        .run()
        .await;

    match result {
        Err(HarvestError::FatalCrawl { source, .. }) => {
            assert!(matches!(source, FetchError::Timeout { .. }));
        }
        other => panic!("expected FatalCrawl, got {:?}", other.map(|r| r.records.len())),
    }
}

#[tokio::test]
async fn test_later_page_failure_keeps_earlier_records() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-1.html", listing_page(1, 20, Some("page-2.html"))).await;
    Mock::given(method("GET"))
        .and(path("/catalogue/page-2.html"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(&server, 5, false);
    let report = Coordinator::new(&config, CancellationToken::new())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.records.len(), 20);
    assert_eq!(report.pages_visited, 1);
    assert_eq!(report.termination, TerminationReason::FatalError);
    assert!(report.is_partial());
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalogue/page-1.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, 1, false);
    let result = Coordinator::new(&config, CancellationToken::new())
        .unwrap()
        .run()
        .await;

    match result {
        Err(HarvestError::FatalCrawl { source, .. }) => {
            assert!(matches!(source, FetchError::HttpStatus { status: 404, .. }));
        }
        other => panic!("expected FatalCrawl, got {:?}", other.map(|r| r.records.len())),
    }
}

#[tokio::test]
async fn test_transient_error_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalogue/page-1.html"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catalogue/page-1.html"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/catalogue/page-1.html", listing_page(1, 4, None)).await;

    let config = create_test_config(&server, 1, false);
    let report = Coordinator::new(&config, CancellationToken::new())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.records.len(), 4);
    assert_eq!(report.termination, TerminationReason::NoNextPage);
}

#[tokio::test]
async fn test_deep_mode_enriches_and_tolerates_detail_failure() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-1.html", listing_page(1, 2, None)).await;
    mount_page(
        &server,
        "/catalogue/book-1_1/index.html",
        detail_page("a897fe39b1053632", "Poetry"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/catalogue/book-2_2/index.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = create_test_config(&server, 1, true);
    let report = Coordinator::new(&config, CancellationToken::new())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.enrichment_failures, 1);
    assert!(report.deep);

    let enriched = &report.records[0];
    assert_eq!(enriched.upc(), Some("a897fe39b1053632"));
    assert_eq!(enriched.category(), Some("Poetry"));
    assert_eq!(enriched.description(), Some("A description, with a comma."));

    let failed = &report.records[1];
    assert!(failed.detail.is_none());
    assert_eq!(failed.title, "Book 2");
    assert_eq!(failed.price.display, "£2.50");
    assert_eq!(failed.availability, 2);
}

#[tokio::test]
async fn test_unrecognized_detail_page_counts_as_failure() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-1.html", listing_page(1, 1, None)).await;
    mount_page(
        &server,
        "/catalogue/book-1_1/index.html",
        "<html><body><h1>Maintenance</h1></body></html>".to_string(),
    )
    .await;

    let config = create_test_config(&server, 1, true);
    let report = Coordinator::new(&config, CancellationToken::new())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.enrichment_failures, 1);
    assert!(report.records[0].detail.is_none());
}

#[tokio::test]
async fn test_duplicates_and_pagination_cycle() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-1.html", listing_page(1, 3, Some("page-2.html"))).await;
    // Page 2 repeats book 3 and links back to page 1
    mount_page(&server, "/catalogue/page-2.html", listing_page(3, 3, Some("page-1.html"))).await;

    let config = create_test_config(&server, 10, false);
    let report = Coordinator::new(&config, CancellationToken::new())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.termination, TerminationReason::NoNextPage);
    assert_eq!(report.duplicate_items, 1);
    let titles: Vec<_> = report.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["Book 1", "Book 2", "Book 3", "Book 4", "Book 5"]);
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-1.html", listing_page(1, 5, Some("page-2.html"))).await;
    mount_page(&server, "/catalogue/page-2.html", listing_page(6, 5, None)).await;
    for i in 1..=10 {
        mount_page(
            &server,
            &format!("/catalogue/book-{i}_{i}/index.html"),
            detail_page(&format!("upc{i}"), "Fiction"),
        )
        .await;
    }

    let config = create_test_config(&server, 3, true);
    let first = Coordinator::new(&config, CancellationToken::new())
        .unwrap()
        .run()
        .await
        .unwrap();
    let second = Coordinator::new(&config, CancellationToken::new())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(first.records.len(), 10);
    assert_eq!(first.records, second.records);
    assert_eq!(first.termination, second.termination);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(1, 1, None)))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let config = create_test_config(&server, 1, false);
    let report = Coordinator::new(&config, cancel).unwrap().run().await.unwrap();

    assert!(report.records.is_empty());
    assert_eq!(report.termination, TerminationReason::Cancelled);
}

#[tokio::test]
async fn test_cancellation_interrupts_slow_request() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-1.html", listing_page(1, 2, Some("page-2.html"))).await;
    Mock::given(method("GET"))
        .and(path("/catalogue/page-2.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(3, 2, None))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, 5, false);
    config.fetch.timeout_secs = 60;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let report = Coordinator::new(&config, cancel).unwrap().run().await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(report.termination, TerminationReason::Cancelled);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.pages_visited, 1);
}

#[tokio::test]
async fn test_progress_events_are_emitted() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-1.html", listing_page(1, 2, None)).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = create_test_config(&server, 1, false);
    let mut coordinator = Coordinator::new(&config, CancellationToken::new())
        .unwrap()
        .with_events(tx);
    coordinator.run().await.unwrap();
    drop(coordinator);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert!(matches!(events[0], ProgressEvent::PageFetched { page: 1, .. }));
    assert!(matches!(
        events[1],
        ProgressEvent::PageParsed {
            page: 1,
            items: 2,
            has_next: false
        }
    ));
    assert_eq!(
        events.last(),
        Some(&ProgressEvent::Finished {
            records: 2,
            pages_visited: 1,
            termination: TerminationReason::NoNextPage,
        })
    );
}

#[tokio::test]
async fn test_pacing_between_requests() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-1.html", listing_page(1, 1, Some("page-2.html"))).await;
    mount_page(&server, "/catalogue/page-2.html", listing_page(2, 1, Some("page-3.html"))).await;
    mount_page(&server, "/catalogue/page-3.html", listing_page(3, 1, None)).await;

    let mut config = create_test_config(&server, 3, false);
    config.crawler.delay = 0.2;

    let started = std::time::Instant::now();
    let report = Coordinator::new(&config, CancellationToken::new())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.pages_visited, 3);
    // Two gaps between three requests
    assert!(started.elapsed() >= Duration::from_millis(400));
}

#[tokio::test]
async fn test_pacing_covers_detail_requests() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-1.html", listing_page(1, 2, None)).await;
    for i in 1..=2 {
        mount_page(
            &server,
            &format!("/catalogue/book-{i}_{i}/index.html"),
            detail_page(&format!("upc{i}"), "Travel"),
        )
        .await;
    }

    let mut config = create_test_config(&server, 1, true);
    config.crawler.delay = 0.2;

    let started = std::time::Instant::now();
    let report = Coordinator::new(&config, CancellationToken::new())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.enrichment_failures, 0);
    // One listing request followed by two detail requests
    assert!(started.elapsed() >= Duration::from_millis(400));
}

#[tokio::test]
async fn test_retry_after_is_honoured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalogue/page-1.html"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/catalogue/page-1.html", listing_page(1, 2, None)).await;

    let config = create_test_config(&server, 1, false);
    let started = std::time::Instant::now();
    let report = Coordinator::new(&config, CancellationToken::new())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.records.len(), 2);
    // The configured backoff caps at 50ms, so only the header explains the wait
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_crawl_entry_point() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-1.html", listing_page(1, 3, Some("page-2.html"))).await;
    mount_page(&server, "/catalogue/page-2.html", listing_page(4, 2, None)).await;

    let config = create_test_config(&server, 5, false);
    let report = crawler::crawl(&config).await.unwrap();

    assert_eq!(report.records.len(), 5);
    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.termination, TerminationReason::NoNextPage);
}

#[tokio::test]
async fn test_cancellation_through_coordinator_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(1, 1, None)))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server, 1, false);
    let mut coordinator = Coordinator::new(&config, CancellationToken::new()).unwrap();
    coordinator.cancellation_token().cancel();
    let report = coordinator.run().await.unwrap();

    assert!(report.records.is_empty());
    assert_eq!(report.termination, TerminationReason::Cancelled);
}

#[tokio::test]
async fn test_crawl_to_csv() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-1.html", listing_page(1, 3, None)).await;

    let config = create_test_config(&server, 1, false);
    let report = Coordinator::new(&config, CancellationToken::new())
        .unwrap()
        .run()
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut sink = CsvSink::new(dir.path().join("books.csv"));
    assert_eq!(sink.write_records(&report).unwrap(), 3);

    let sample = sink.sample(5).unwrap();
    assert_eq!(sample.len(), 3);
    assert_eq!(sample[2].title, "Book 3");
    assert_eq!(sample[2].price, "£3.50");
    assert_eq!(sample[2].rating, "3");
}
