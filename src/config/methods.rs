//! Builder methods available for all states
//!
//! This module contains methods that can be called on the builder
//! regardless of its current type state.

use std::path::PathBuf;
use std::time::Duration;

use super::builder::ScrapeConfigBuilder;
use super::types::ScopeMode;

impl<State> ScrapeConfigBuilder<State> {
    /// Total attempts per fetch, including the first
    ///
    /// `1` disables escalation entirely. Values below 1 are rejected by
    /// `build()`.
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.retry.max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry.backoff = backoff;
        self
    }

    /// Base of the random pause between tasks in a URL list run
    #[must_use]
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.retry.jitter = jitter;
        self
    }

    /// Relaunch the browser session before every retry
    #[must_use]
    pub fn fresh_session_on_retry(mut self, enabled: bool) -> Self {
        self.retry.fresh_session = enabled;
        self
    }

    /// Force a circuit rotation before every retry
    ///
    /// Only has an effect when a rotation throttle is attached, which the
    /// binary does only with proxy routing enabled.
    #[must_use]
    pub fn force_rotation_on_retry(mut self, enabled: bool) -> Self {
        self.retry.force_rotation = enabled;
        self
    }

    /// Switch to a fingerprint with a different user agent before every retry
    #[must_use]
    pub fn rerandomize_on_retry(mut self, enabled: bool) -> Self {
        self.retry.rerandomize_fingerprint = enabled;
        self
    }

    #[must_use]
    pub fn circuit_settle(mut self, pause: Duration) -> Self {
        self.retry.circuit_settle = pause;
        self
    }

    /// Allow at most `max` fetches inside any trailing `interval`
    #[must_use]
    pub fn rate_limit(mut self, max: u32, interval: Duration) -> Self {
        self.rate_limit.max_per_interval = Some(max);
        self.rate_limit.interval = interval;
        self
    }

    #[must_use]
    pub fn min_delay(mut self, delay: Duration) -> Self {
        self.rate_limit.min_delay = delay;
        self
    }

    #[must_use]
    pub fn scope(mut self, scope: ScopeMode) -> Self {
        self.scope = scope;
        self
    }

    /// Regexes of which at least one must match a URL for it to be crawled
    #[must_use]
    pub fn include_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Regexes that exclude a URL when any of them matches
    #[must_use]
    pub fn exclude_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages;
        self
    }

    #[must_use]
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Maximum number of fetches in flight during a crawl batch
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Route browser traffic through the SOCKS proxy
    #[must_use]
    pub fn proxy_enabled(mut self, enabled: bool) -> Self {
        self.anonymity.proxy_enabled = enabled;
        self
    }

    #[must_use]
    pub fn socks_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.anonymity.socks_host = host.into();
        self.anonymity.socks_port = port;
        self
    }

    #[must_use]
    pub fn control_port(mut self, port: u16) -> Self {
        self.anonymity.control_port = port;
        self
    }

    #[must_use]
    pub fn control_password(mut self, password: Option<String>) -> Self {
        self.anonymity.control_password = password.filter(|p| !p.is_empty());
        self
    }

    /// Gate for throttled rotations: both must hold before a rotation fires
    #[must_use]
    pub fn rotation_gate(mut self, min_interval: Duration, request_threshold: u64) -> Self {
        self.anonymity.rotation_min_interval = min_interval;
        self.anonymity.rotation_threshold = request_threshold;
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.browser.headless = headless;
        self
    }

    #[must_use]
    pub fn page_timeout(mut self, timeout: Duration) -> Self {
        self.browser.page_timeout = timeout;
        self
    }

    #[must_use]
    pub fn randomize_fingerprint(mut self, randomize: bool) -> Self {
        self.browser.randomize_fingerprint = randomize;
        self
    }

    #[must_use]
    pub fn user_agent_override(mut self, user_agent: Option<String>) -> Self {
        self.browser.user_agent_override = user_agent.filter(|ua| !ua.trim().is_empty());
        self
    }

    #[must_use]
    pub fn chrome_executable(mut self, path: Option<PathBuf>) -> Self {
        self.browser.chrome_executable = path;
        self
    }
}
