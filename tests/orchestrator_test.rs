//! Per-task orchestration: persistence, rotation bookkeeping and run totals

mod common;

use common::{AcceptingControl, Reply, StubBackend, quick_retry, scraper};
use ghostcrawl::{CircuitRotator, FetchTask, TaskTemplate};
use std::sync::Arc;
use std::time::Duration;

fn template() -> TaskTemplate {
    TaskTemplate::new(["h1".to_string()], None, "scrape")
}

#[tokio::test]
async fn clean_page_is_cleaned_and_persisted() {
    let url = "https://a.test/page";
    let backend = Arc::new(StubBackend::new().route(url, &[Reply::Clean], &[]));
    let (scraper, storage) = scraper(backend, quick_retry(1));

    let outcome = scraper
        .run_task(&FetchTask::new(url, &template()), false)
        .await
        .unwrap();

    assert!(!outcome.is_failure());
    assert!(outcome.location.is_some());
    assert_eq!(outcome.page.data["h1"][0].text, "https://a.test/page text");

    let saved = storage.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, "scrape");
    assert_eq!(saved[0].1["url"], url);
    assert_eq!(saved[0].1["blocked"], false);
    assert_eq!(saved[0].1["attempts"], 1);
}

#[tokio::test]
async fn failed_fetch_is_neither_persisted_nor_counted() {
    let url = "https://a.test/down";
    let backend = Arc::new(StubBackend::new().route(url, &[Reply::Fail], &[]));
    let control = Arc::new(AcceptingControl::default());
    let rotator = Arc::new(CircuitRotator::new(control.clone(), None, Duration::ZERO, 1));
    let (scraper, storage) = scraper(backend, quick_retry(2));
    let scraper = scraper.with_rotator(rotator.clone());

    let outcome = scraper
        .run_task(&FetchTask::new(url, &template()), false)
        .await
        .unwrap();

    assert!(outcome.is_failure());
    assert!(outcome.location.is_none());
    assert_eq!(outcome.page.attempts, 2);
    assert!(storage.saved().is_empty());
    assert_eq!(rotator.requests_since_rotation(), 0);
    assert_eq!(control.rotations(), 0);
}

#[tokio::test]
async fn blocked_page_is_persisted_with_flag() {
    let url = "https://a.test/wall";
    let backend = Arc::new(StubBackend::new().route(url, &[Reply::Blocked], &[]));
    let (scraper, storage) = scraper(backend, quick_retry(2));

    let outcome = scraper
        .run_task(&FetchTask::new(url, &template()), false)
        .await
        .unwrap();

    assert!(outcome.page.blocked);
    assert_eq!(outcome.page.attempts, 2);
    let saved = storage.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].1["blocked"], true);
}

#[tokio::test]
async fn rotation_fires_once_threshold_is_reached() {
    let backend = Arc::new(
        StubBackend::new()
            .route("https://a.test/1", &[Reply::Clean], &[])
            .route("https://a.test/2", &[Reply::Clean], &[])
            .route("https://a.test/3", &[Reply::Clean], &[]),
    );
    let control = Arc::new(AcceptingControl::default());
    let rotator = Arc::new(CircuitRotator::new(control.clone(), None, Duration::ZERO, 2));
    let (scraper, _storage) = scraper(backend, quick_retry(1));
    let scraper = scraper.with_rotator(rotator.clone());

    for url in ["https://a.test/1", "https://a.test/2"] {
        scraper
            .run_task(&FetchTask::new(url, &template()), false)
            .await
            .unwrap();
    }
    assert_eq!(control.rotations(), 1);
    assert_eq!(rotator.requests_since_rotation(), 0);

    scraper
        .run_task(&FetchTask::new("https://a.test/3", &template()), false)
        .await
        .unwrap();
    assert_eq!(control.rotations(), 1);
    assert_eq!(rotator.requests_since_rotation(), 1);
}

#[tokio::test]
async fn run_all_records_every_url_and_aggregates() {
    let backend = Arc::new(
        StubBackend::new()
            .route("https://a.test/ok", &[Reply::Clean], &[])
            .route("https://a.test/wall", &[Reply::Blocked], &[]),
    );
    let (scraper, storage) = scraper(backend, quick_retry(1));
    let urls = vec![
        "https://a.test/ok".to_string(),
        "https://a.test/missing".to_string(),
        "https://a.test/wall".to_string(),
    ];

    let summary = scraper
        .run_all(&urls, &template(), Duration::ZERO, true)
        .await
        .unwrap();

    assert_eq!(summary.saved.len(), 2);
    assert_eq!(summary.blocked, vec!["https://a.test/wall".to_string()]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, "https://a.test/missing");
    assert_eq!(summary.total(), 3);
    assert!(summary.aggregate.is_some());

    let saved = storage.saved();
    let (stem, aggregate) = saved.last().unwrap();
    assert_eq!(stem, "scrape_aggregate");
    let keys: Vec<&String> = aggregate.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["https://a.test/ok", "https://a.test/wall"]);
}

#[tokio::test]
async fn run_all_skips_invalid_urls_without_fetching() {
    let backend = Arc::new(StubBackend::new().route("https://a.test/ok", &[Reply::Clean], &[]));
    let (scraper, storage) = scraper(backend.clone(), quick_retry(1));
    let urls = vec!["ftp://a.test/file".to_string(), "https://a.test/ok".to_string()];

    let summary = scraper
        .run_all(&urls, &template(), Duration::ZERO, false)
        .await
        .unwrap();

    assert_eq!(summary.saved.len(), 1);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, "ftp://a.test/file");
    assert!(summary.failed[0].1.contains("invalid URL"));
    assert_eq!(backend.grab_count("ftp://a.test/file"), 0);
    assert_eq!(storage.saved().len(), 1);
}

#[tokio::test]
async fn persisted_data_keeps_selector_order() {
    let url = "https://a.test/page";
    let backend = Arc::new(StubBackend::new().route(url, &[Reply::Clean], &[]));
    let (scraper, storage) = scraper(backend, quick_retry(1));
    let template = TaskTemplate::new(
        ["h1", ".price", "a.title"].map(String::from),
        None,
        "ordered",
    );

    scraper
        .run_task(&FetchTask::new(url, &template), false)
        .await
        .unwrap();

    let saved = storage.saved();
    let keys: Vec<&String> = saved[0].1["data"].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["h1", ".price", "a.title"]);
}
