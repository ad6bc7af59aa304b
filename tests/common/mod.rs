//! Scripted stand-ins for the browser, storage and Tor control port

#![allow(dead_code)]

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ghostcrawl::anonymity::{CircuitControl, RotationError};
use ghostcrawl::config::RetryPolicy;
use ghostcrawl::{
    ActiveFingerprint, EscalatingFetchPolicy, FetchBackend, FetchError, FetchTask,
    FingerprintPool, PageRecord, PageSnapshot, ScrapeResult, Scraper, Storage,
};

/// What the stub returns for one navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Clean,
    Blocked,
    Fail,
}

#[derive(Debug, Clone)]
struct Route {
    replies: Vec<Reply>,
    links: Vec<String>,
}

/// Backend serving canned pages
///
/// Each URL has a reply script consumed one entry per grab; the last entry
/// repeats. Unknown URLs fail with a navigation error.
pub struct StubBackend {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<HashMap<String, usize>>,
    grabs: Mutex<Vec<(String, String)>>,
    relaunches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    concurrent: bool,
    delay: Duration,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            grabs: Mutex::new(Vec::new()),
            relaunches: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            concurrent: true,
            delay: Duration::from_millis(5),
        }
    }

    pub fn single_session(mut self) -> Self {
        self.concurrent = false;
        self
    }

    pub fn route(self, url: &str, replies: &[Reply], links: &[&str]) -> Self {
        self.routes.lock().insert(
            url.to_string(),
            Route {
                replies: replies.to_vec(),
                links: links.iter().map(|l| (*l).to_string()).collect(),
            },
        );
        self
    }

    /// `(url, user agent)` for every grab, in call order
    pub fn grabs(&self) -> Vec<(String, String)> {
        self.grabs.lock().clone()
    }

    pub fn grab_count(&self, url: &str) -> usize {
        self.calls.lock().get(url).copied().unwrap_or(0)
    }

    pub fn relaunches(&self) -> usize {
        self.relaunches.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, url: &str) -> Option<(Reply, Vec<String>)> {
        let seen = {
            let mut calls = self.calls.lock();
            let count = calls.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count - 1
        };
        let route = self.routes.lock().get(url).cloned()?;
        let idx = seen.min(route.replies.len().saturating_sub(1));
        route.replies.get(idx).map(|reply| (*reply, route.links))
    }
}

impl FetchBackend for StubBackend {
    fn engine_name(&self) -> &'static str {
        "stub"
    }

    fn supports_concurrency(&self) -> bool {
        self.concurrent
    }

    fn grab<'a>(
        &'a self,
        task: &'a FetchTask,
        fingerprint: &'a ActiveFingerprint,
        _timeout: Duration,
        gather_links: bool,
    ) -> BoxFuture<'a, Result<PageSnapshot, FetchError>> {
        Box::pin(async move {
            self.grabs
                .lock()
                .push((task.url.clone(), fingerprint.user_agent.clone()));

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let Some((reply, links)) = self.next_reply(&task.url) else {
                return Err(FetchError::Navigation(format!("no route to {}", task.url)));
            };

            let raw_html = match reply {
                Reply::Fail => {
                    return Err(FetchError::Timeout {
                        operation: "navigation".to_string(),
                        millis: 15_000,
                    });
                }
                Reply::Blocked => {
                    r#"<html><body><div id="cf-challenge">Just a moment</div></body></html>"#
                }
                Reply::Clean => "<html><body><h1>Product</h1></body></html>",
            };

            Ok(PageSnapshot {
                records: task
                    .selectors
                    .iter()
                    .map(|selector| {
                        (
                            selector.clone(),
                            vec![PageRecord::new(format!("  {}  text ", task.url), "")],
                        )
                    })
                    .collect(),
                links: if gather_links { links } else { Vec::new() },
                raw_html: raw_html.to_string(),
            })
        })
    }

    fn relaunch(&self) -> BoxFuture<'_, Result<(), FetchError>> {
        Box::pin(async move {
            self.relaunches.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn shutdown(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

/// Storage that keeps payloads in memory
#[derive(Default)]
pub struct MemoryStorage {
    saved: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MemoryStorage {
    pub fn saved(&self) -> Vec<(String, serde_json::Value)> {
        self.saved.lock().clone()
    }
}

impl Storage for MemoryStorage {
    fn persist<'a>(
        &'a self,
        payload: serde_json::Value,
        stem: &'a str,
    ) -> BoxFuture<'a, ScrapeResult<PathBuf>> {
        Box::pin(async move {
            let mut saved = self.saved.lock();
            saved.push((stem.to_string(), payload));
            Ok(PathBuf::from(format!("memory/{stem}_{}.json", saved.len())))
        })
    }
}

/// Control port that acknowledges every rotation
#[derive(Default)]
pub struct AcceptingControl {
    pub rotations: AtomicUsize,
}

impl AcceptingControl {
    pub fn rotations(&self) -> usize {
        self.rotations.load(Ordering::SeqCst)
    }
}

impl CircuitControl for AcceptingControl {
    fn is_reachable(&self) -> BoxFuture<'_, bool> {
        Box::pin(async { true })
    }

    fn request_rotation<'a>(
        &'a self,
        _credential: Option<&'a str>,
    ) -> BoxFuture<'a, Result<bool, RotationError>> {
        Box::pin(async move {
            self.rotations.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        })
    }
}

/// Ladder with no pauses, so tests run in real time
pub fn quick_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff: Duration::ZERO,
        jitter: Duration::ZERO,
        circuit_settle: Duration::ZERO,
        ..RetryPolicy::default()
    }
}

pub fn policy(backend: Arc<StubBackend>, retry: RetryPolicy) -> EscalatingFetchPolicy {
    let pool = FingerprintPool::new();
    EscalatingFetchPolicy::new(backend, pool, pool.deterministic(), retry).with_seed(7)
}

pub fn scraper(backend: Arc<StubBackend>, retry: RetryPolicy) -> (Scraper, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::default());
    let scraper = Scraper::new(
        policy(backend, retry),
        Arc::clone(&storage) as Arc<dyn Storage>,
        Duration::from_secs(1),
    );
    (scraper, storage)
}
