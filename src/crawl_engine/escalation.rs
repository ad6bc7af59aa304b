//! Escalating fetch policy
//!
//! Attempt 1 uses the current session and the baseline fingerprint. Every
//! later attempt may first relaunch the session, force a circuit rotation and
//! switch to a fingerprint with a different user agent, as configured. The
//! ladder stops at the first clean attempt or after `max_attempts`; only the
//! terminal attempt is returned.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::block_detect;
use super::crawl_types::{AttemptResult, FetchTask};
use super::rate_limiter::RateLimiter;
use crate::anonymity::CircuitRotator;
use crate::backend::FetchBackend;
use crate::config::RetryPolicy;
use crate::fingerprint::{ActiveFingerprint, FingerprintPool};

pub struct EscalatingFetchPolicy {
    backend: Arc<dyn FetchBackend>,
    pool: FingerprintPool,
    baseline: ActiveFingerprint,
    retry: RetryPolicy,
    rate_limiter: Option<Arc<RateLimiter>>,
    rotator: Option<Arc<CircuitRotator>>,
    rng: parking_lot::Mutex<StdRng>,
}

impl EscalatingFetchPolicy {
    #[must_use]
    pub fn new(
        backend: Arc<dyn FetchBackend>,
        pool: FingerprintPool,
        baseline: ActiveFingerprint,
        retry: RetryPolicy,
    ) -> Self {
        let baseline = baseline.with_engine(backend.engine_name());
        Self {
            backend,
            pool,
            baseline,
            retry,
            rate_limiter: None,
            rotator: None,
            rng: parking_lot::Mutex::new(StdRng::from_rng(&mut rand::rng())),
        }
    }

    /// Pace every attempt, retries included, through `limiter`
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Enable forced rotations before retries
    #[must_use]
    pub fn with_rotator(mut self, rotator: Arc<CircuitRotator>) -> Self {
        self.rotator = Some(rotator);
        self
    }

    /// Make fingerprint rerandomization reproducible
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn FetchBackend> {
        &self.backend
    }

    #[must_use]
    pub fn baseline(&self) -> &ActiveFingerprint {
        &self.baseline
    }

    /// Run the attempt ladder for `task` and return the terminal attempt
    ///
    /// Never fails: navigation errors and blocks are data on the result.
    pub async fn fetch(&self, task: &FetchTask, timeout: Duration, gather_links: bool) -> AttemptResult {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut fingerprint = self.baseline.clone();
        let mut attempt = 1;

        loop {
            if attempt > 1 {
                fingerprint = self.escalate(fingerprint).await;
            }

            if let Some(limiter) = &self.rate_limiter {
                limiter.acquire().await;
            }

            let result = self
                .attempt(task, &fingerprint, timeout, gather_links, attempt)
                .await;

            if result.is_success() {
                if attempt > 1 {
                    info!("{} succeeded on attempt {attempt}/{max_attempts}", task.url);
                }
                return result;
            }

            let reason = match &result.error {
                Some(e) => e.to_string(),
                None => "blocked".to_string(),
            };

            if attempt >= max_attempts {
                warn!(
                    "{} gave up after {attempt} attempt(s): {reason}",
                    task.url
                );
                return result;
            }

            warn!(
                "{} attempt {attempt}/{max_attempts} failed ({reason}); retrying in {:.1}s",
                task.url,
                self.retry.backoff.as_secs_f64()
            );
            tokio::time::sleep(self.retry.backoff).await;
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        task: &FetchTask,
        fingerprint: &ActiveFingerprint,
        timeout: Duration,
        gather_links: bool,
        attempt: u32,
    ) -> AttemptResult {
        debug!("{} attempt {attempt} as {}", task.url, fingerprint.user_agent);

        match self
            .backend
            .grab(task, fingerprint, timeout, gather_links)
            .await
        {
            Ok(snapshot) => {
                let blocked = match block_detect::first_signature(&snapshot.raw_html) {
                    Some(signature) => {
                        warn!("{} looks blocked (matched '{signature}')", task.url);
                        true
                    }
                    None => false,
                };
                AttemptResult {
                    records: snapshot.records,
                    links: snapshot.links,
                    raw_html: snapshot.raw_html,
                    blocked,
                    attempt,
                    fingerprint: fingerprint.clone(),
                    error: None,
                }
            }
            Err(error) => AttemptResult {
                records: task
                    .selectors
                    .iter()
                    .map(|selector| (selector.clone(), Vec::new()))
                    .collect(),
                links: Vec::new(),
                raw_html: String::new(),
                blocked: false,
                attempt,
                fingerprint: fingerprint.clone(),
                error: Some(error),
            },
        }
    }

    /// Apply the configured escalation actions before a retry
    async fn escalate(&self, previous: ActiveFingerprint) -> ActiveFingerprint {
        if self.retry.fresh_session {
            info!("Relaunching browser session before retry");
            if let Err(e) = self.backend.relaunch().await {
                warn!("Session relaunch failed: {e}");
            }
        }

        if self.retry.force_rotation
            && let Some(rotator) = &self.rotator
            && rotator.force_rotate().await
            && !self.retry.circuit_settle.is_zero()
        {
            debug!(
                "Waiting {:.1}s for the new circuit",
                self.retry.circuit_settle.as_secs_f64()
            );
            tokio::time::sleep(self.retry.circuit_settle).await;
        }

        if !self.retry.rerandomize_fingerprint {
            return previous;
        }

        let next = {
            let mut rng = self.rng.lock();
            self.pool
                .random_distinct_from(&previous.user_agent, &mut *rng)
        };
        match next {
            Some(fingerprint) => {
                info!("Switching fingerprint to {}", fingerprint.user_agent);
                fingerprint.with_engine(self.backend.engine_name())
            }
            None => {
                debug!("No profile with a different user agent; using baseline");
                self.baseline.clone()
            }
        }
    }
}
