//! Task orchestration
//!
//! `Scraper` runs one task end to end: escalating fetch, cleaning,
//! persistence, then rotation bookkeeping. `run_all` drives a plain URL list
//! through it with randomized pacing between tasks.

use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::crawl_types::{
    CleanedPage, FetchTask, ScrapeError, ScrapeResult, TaskOutcome, TaskTemplate,
};
use super::escalation::EscalatingFetchPolicy;
use crate::anonymity::CircuitRotator;
use crate::cleaner::clean_page_data;
use crate::content_saver::Storage;
use crate::utils::is_valid_url;

/// Per-run totals for a URL list
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// URL and output location of every persisted page, blocked ones included
    pub saved: Vec<(String, PathBuf)>,
    /// URLs whose terminal attempt was still blocked
    pub blocked: Vec<String>,
    /// URL and reason for every task that produced nothing
    pub failed: Vec<(String, String)>,
    pub aggregate: Option<PathBuf>,
}

impl RunSummary {
    #[must_use]
    pub fn total(&self) -> usize {
        self.saved.len() + self.failed.len()
    }
}

pub struct Scraper {
    policy: EscalatingFetchPolicy,
    storage: Arc<dyn Storage>,
    rotator: Option<Arc<CircuitRotator>>,
    timeout: Duration,
}

impl Scraper {
    #[must_use]
    pub fn new(policy: EscalatingFetchPolicy, storage: Arc<dyn Storage>, timeout: Duration) -> Self {
        Self {
            policy,
            storage,
            rotator: None,
            timeout,
        }
    }

    /// Count completed fetches and rotate the circuit when due
    #[must_use]
    pub fn with_rotator(mut self, rotator: Arc<CircuitRotator>) -> Self {
        self.rotator = Some(rotator);
        self
    }

    /// Whether fetches may run concurrently on this scraper's backend
    #[must_use]
    pub fn supports_concurrency(&self) -> bool {
        self.policy.backend().supports_concurrency()
    }

    /// Fetch, clean, persist and account for one task
    ///
    /// A fetch that ended in an error is reported on the outcome and neither
    /// persisted nor counted toward rotation. Blocked pages are persisted
    /// with their flag set.
    ///
    /// # Errors
    /// Only persistence failures are raised.
    pub async fn run_task(&self, task: &FetchTask, gather_links: bool) -> ScrapeResult<TaskOutcome> {
        let result = self.policy.fetch(task, self.timeout, gather_links).await;

        let page = CleanedPage {
            url: task.url.clone(),
            blocked: result.blocked,
            attempts: result.attempt,
            fingerprint: result.fingerprint,
            data: clean_page_data(&result.records),
        };

        if let Some(error) = result.error {
            return Ok(TaskOutcome {
                page,
                location: None,
                links: Vec::new(),
                error: Some(error),
            });
        }

        let location = self
            .storage
            .persist(serde_json::to_value(&page)?, &task.stem)
            .await?;

        if let Some(rotator) = &self.rotator {
            rotator.increment();
            rotator.maybe_rotate().await;
        }

        Ok(TaskOutcome {
            page,
            location: Some(location),
            links: result.links,
            error: None,
        })
    }

    /// Process `urls` sequentially, pausing `jitter + U(0, jitter)` between tasks
    ///
    /// When `aggregate` is set every persisted page is also written to one
    /// `{stem}_aggregate` file keyed by URL.
    ///
    /// # Errors
    /// Only a failure to write the aggregate is raised; per-URL failures are
    /// recorded in the summary.
    pub async fn run_all(
        &self,
        urls: &[String],
        template: &TaskTemplate,
        jitter: Duration,
        aggregate: bool,
    ) -> ScrapeResult<RunSummary> {
        let mut summary = RunSummary::default();
        let mut pages: BTreeMap<String, CleanedPage> = BTreeMap::new();

        for (idx, url) in urls.iter().enumerate() {
            info!("Processing {}/{}: {url}", idx + 1, urls.len());
            if !is_valid_url(url) {
                let e = ScrapeError::InvalidUrl(url.clone());
                error!("Skipping {url}: {e}");
                summary.failed.push((url.clone(), e.to_string()));
                continue;
            }
            let task = FetchTask::new(url.clone(), template);

            match self.run_task(&task, false).await {
                Ok(outcome) => match (outcome.error, outcome.location) {
                    (Some(e), _) => {
                        error!("Failed {url} after {} attempt(s): {e}", outcome.page.attempts);
                        summary.failed.push((url.clone(), e.to_string()));
                    }
                    (None, Some(location)) => {
                        if outcome.page.blocked {
                            warn!("Saved {url} still blocked: {}", location.display());
                            summary.blocked.push(url.clone());
                        } else {
                            info!("Success {url} (attempt {}) saved {}", outcome.page.attempts, location.display());
                        }
                        summary.saved.push((url.clone(), location));
                        if aggregate {
                            pages.insert(url.clone(), outcome.page);
                        }
                    }
                    (None, None) => {}
                },
                Err(e) => {
                    error!("Failed {url}: {e}");
                    summary.failed.push((url.clone(), e.to_string()));
                }
            }

            if idx + 1 < urls.len() {
                tokio::time::sleep(pacing_pause(jitter)).await;
            }
        }

        if aggregate {
            let stem = format!("{}_aggregate", template.stem);
            let location = self
                .storage
                .persist(serde_json::to_value(&pages)?, &stem)
                .await?;
            info!("Aggregated output saved: {}", location.display());
            summary.aggregate = Some(location);
        }

        Ok(summary)
    }

    /// Release the backend
    pub async fn close(&self) {
        self.policy.backend().shutdown().await;
    }
}

/// `jitter + U(0, jitter)`
fn pacing_pause(jitter: Duration) -> Duration {
    if jitter.is_zero() {
        return Duration::ZERO;
    }
    let extra = rand::rng().random_range(0.0..=jitter.as_secs_f64());
    jitter + Duration::from_secs_f64(extra)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacing_stays_within_one_to_two_jitters() {
        let jitter = Duration::from_millis(500);
        for _ in 0..100 {
            let pause = pacing_pause(jitter);
            assert!(pause >= jitter && pause <= jitter * 2, "{pause:?}");
        }
        assert_eq!(pacing_pause(Duration::ZERO), Duration::ZERO);
    }
}
