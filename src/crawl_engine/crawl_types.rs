//! Core types for fetch and crawl operations.
//!
//! This module contains the task, frontier and attempt types shared by the
//! escalation policy, the orchestrator and the crawler, together with the
//! error types they surface.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::fingerprint::ActiveFingerprint;
use crate::page_extractor::schema::SelectorRecords;

/// Failure of a single fetch attempt
///
/// Always transient from the policy's point of view: it is retried inside the
/// attempt ladder and, when the ladder is exhausted, reported in the terminal
/// [`AttemptResult`] instead of being raised.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FetchError {
    /// Navigation failed (DNS, connection refused, TLS, ...)
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Navigation or wait-selector exceeded its deadline
    #[error("{operation} timed out after {millis} ms")]
    Timeout { operation: String, millis: u64 },

    /// Browser session could not be created or crashed
    #[error("browser session error: {0}")]
    Session(String),

    /// Page content could not be read
    #[error("content extraction failed: {0}")]
    Extraction(String),
}

/// Errors surfaced by the orchestration layer
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Anonymity routing is mandatory but the SOCKS endpoint is unreachable
    #[error("anonymity proxy unreachable at {host}:{port}")]
    AnonymityUnavailable { host: String, port: u16 },

    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// URL could not be parsed
    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    /// Writing a result failed
    #[error("failed to persist results: {0}")]
    Persist(#[from] std::io::Error),

    /// Payload could not be serialized
    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Convenience alias for Result with `ScrapeError`
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// One logical fetch. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTask {
    pub url: String,
    /// Extraction selectors in caller order, without duplicates
    pub selectors: Vec<String>,
    pub wait_selector: Option<String>,
    /// Filename stem for persisted output
    pub stem: String,
}

impl FetchTask {
    #[must_use]
    pub fn new(url: impl Into<String>, template: &TaskTemplate) -> Self {
        Self {
            url: url.into(),
            selectors: template.selectors.clone(),
            wait_selector: template.wait_selector.clone(),
            stem: template.stem.clone(),
        }
    }
}

/// Everything a [`FetchTask`] carries except the URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub selectors: Vec<String>,
    pub wait_selector: Option<String>,
    pub stem: String,
}

impl TaskTemplate {
    /// Build a template, dropping repeated selectors but keeping their order
    #[must_use]
    pub fn new(
        selectors: impl IntoIterator<Item = String>,
        wait_selector: Option<String>,
        stem: impl Into<String>,
    ) -> Self {
        let mut ordered: Vec<String> = Vec::new();
        for selector in selectors {
            if !ordered.contains(&selector) {
                ordered.push(selector);
            }
        }

        Self {
            selectors: ordered,
            wait_selector,
            stem: stem.into(),
        }
    }
}

/// Represents an item in the crawl frontier with URL and depth tracking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
}

/// Outcome of one fetch attempt
///
/// The escalation policy produces one of these per attempt and returns only
/// the terminal one. Callers must inspect `blocked` and `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResult {
    pub records: SelectorRecords,
    pub links: Vec<String>,
    #[serde(skip_serializing)]
    pub raw_html: String,
    pub blocked: bool,
    /// 1-based attempt number
    pub attempt: u32,
    pub fingerprint: ActiveFingerprint,
    pub error: Option<FetchError>,
}

impl AttemptResult {
    /// Neither blocked nor errored
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.blocked && self.error.is_none()
    }
}

/// Cleaned, serializable result for one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedPage {
    pub url: String,
    pub blocked: bool,
    pub attempts: u32,
    pub fingerprint: ActiveFingerprint,
    pub data: SelectorRecords,
}

/// What the orchestrator reports for one task
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub page: CleanedPage,
    /// Where the page was persisted; `None` when the fetch failed
    pub location: Option<PathBuf>,
    /// Raw outbound hrefs, unresolved
    pub links: Vec<String>,
    pub error: Option<FetchError>,
}

impl TaskOutcome {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}
