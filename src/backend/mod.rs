//! Fetch backends
//!
//! A backend owns the browser engine and knows how to turn one task plus one
//! fingerprint into a [`PageSnapshot`]. Block detection, retries and
//! bookkeeping live above it in the escalation policy.

pub mod chromium;

use futures::future::BoxFuture;
use std::time::Duration;

use crate::crawl_engine::crawl_types::{FetchError, FetchTask};
use crate::fingerprint::ActiveFingerprint;
use crate::page_extractor::PageSnapshot;

pub use chromium::ChromiumBackend;

/// Capability the escalation policy consumes
pub trait FetchBackend: Send + Sync {
    /// Short engine name recorded in every fingerprint
    fn engine_name(&self) -> &'static str;

    /// Whether `grab` may be called concurrently
    ///
    /// Callers clamp their concurrency to 1 when this is `false`.
    fn supports_concurrency(&self) -> bool;

    /// Navigate to `task.url` presenting `fingerprint`, then read the page
    ///
    /// Selector failures must not fail the grab; they map to empty lists.
    fn grab<'a>(
        &'a self,
        task: &'a FetchTask,
        fingerprint: &'a ActiveFingerprint,
        timeout: Duration,
        gather_links: bool,
    ) -> BoxFuture<'a, Result<PageSnapshot, FetchError>>;

    /// Tear down the current session and start a fresh one
    fn relaunch(&self) -> BoxFuture<'_, Result<(), FetchError>>;

    /// Release the engine. Further grabs may start a new session.
    fn shutdown(&self) -> BoxFuture<'_, ()>;
}
