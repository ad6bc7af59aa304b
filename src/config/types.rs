//! Core configuration types for scraping and crawling
//!
//! `ScrapeConfig` is immutable once built. Components receive the sub-struct
//! they need rather than the whole config.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::crawl_engine::crawl_types::ScrapeError;
use crate::utils::constants::{
    DEFAULT_CIRCUIT_SETTLE, DEFAULT_CONCURRENCY, DEFAULT_JITTER, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES, DEFAULT_RATE_INTERVAL, DEFAULT_RETRY_BACKOFF,
    DEFAULT_ROTATION_MIN_INTERVAL, DEFAULT_ROTATION_REQUEST_THRESHOLD, DEFAULT_TIMEOUT_MS,
    DEFAULT_TOR_CONTROL_PORT, DEFAULT_TOR_HOST, DEFAULT_TOR_SOCKS_PORT,
};

/// Which hosts a crawl may follow links to, relative to the first seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeMode {
    /// Exact host equality with the seed
    #[default]
    SameHost,
    /// Any host ending with the seed's last two labels
    Subdomains,
    /// No host restriction
    CrossDomain,
}

impl FromStr for ScopeMode {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "same-host" | "same_host" | "host" => Ok(Self::SameHost),
            "subdomains" | "subdomain" => Ok(Self::Subdomains),
            "cross-domain" | "cross_domain" | "any" => Ok(Self::CrossDomain),
            other => Err(ScrapeError::Config(format!("unknown scope mode '{other}'"))),
        }
    }
}

/// Escalation ladder knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per fetch, at least 1
    pub max_attempts: u32,
    /// Fixed pause between attempts
    pub backoff: Duration,
    /// Inter-task pacing base; each pause is `jitter + U(0, jitter)`
    pub jitter: Duration,
    /// Relaunch the browser session before each retry
    pub fresh_session: bool,
    /// Force a circuit rotation before each retry
    pub force_rotation: bool,
    /// Pick a fingerprint with a different user agent before each retry
    pub rerandomize_fingerprint: bool,
    /// Pause after a forced rotation so the new circuit can come up
    pub circuit_settle: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_RETRY_BACKOFF,
            jitter: DEFAULT_JITTER,
            fresh_session: false,
            force_rotation: false,
            rerandomize_fingerprint: false,
            circuit_settle: DEFAULT_CIRCUIT_SETTLE,
        }
    }
}

/// Rate limiter knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Maximum acquisitions inside any trailing `interval`; `None` disables
    pub max_per_interval: Option<u32>,
    pub interval: Duration,
    /// Minimum spacing between acquisitions; zero disables
    pub min_delay: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_per_interval: None,
            interval: DEFAULT_RATE_INTERVAL,
            min_delay: Duration::ZERO,
        }
    }
}

/// Crawl frontier knobs
///
/// Include/exclude patterns are compiled when the options are built, so a
/// bad pattern is a configuration error rather than a mid-crawl failure.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub scope: ScopeMode,
    pub include: Vec<Regex>,
    pub exclude: Vec<Regex>,
    pub max_pages: usize,
    pub max_depth: u32,
    pub concurrency: usize,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            scope: ScopeMode::default(),
            include: Vec::new(),
            exclude: Vec::new(),
            max_pages: DEFAULT_MAX_PAGES,
            max_depth: DEFAULT_MAX_DEPTH,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl CrawlOptions {
    /// Compile include and exclude patterns
    ///
    /// # Errors
    /// `ScrapeError::Config` naming the first pattern that fails to compile.
    pub fn with_patterns<S: AsRef<str>>(
        mut self,
        include: &[S],
        exclude: &[S],
    ) -> Result<Self, ScrapeError> {
        self.include = compile_patterns(include)?;
        self.exclude = compile_patterns(exclude)?;
        Ok(self)
    }
}

pub(crate) fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, ScrapeError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p.as_ref())
                .map_err(|e| ScrapeError::Config(format!("invalid pattern '{}': {e}", p.as_ref())))
        })
        .collect()
}

/// Proxy routing and circuit rotation knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymitySettings {
    /// Route traffic through the SOCKS endpoint; unreachable is fatal at startup
    pub proxy_enabled: bool,
    pub socks_host: String,
    pub socks_port: u16,
    pub control_port: u16,
    #[serde(skip_serializing)]
    pub control_password: Option<String>,
    pub rotation_min_interval: Duration,
    pub rotation_threshold: u64,
}

impl Default for AnonymitySettings {
    fn default() -> Self {
        Self {
            proxy_enabled: false,
            socks_host: DEFAULT_TOR_HOST.to_string(),
            socks_port: DEFAULT_TOR_SOCKS_PORT,
            control_port: DEFAULT_TOR_CONTROL_PORT,
            control_password: None,
            rotation_min_interval: DEFAULT_ROTATION_MIN_INTERVAL,
            rotation_threshold: DEFAULT_ROTATION_REQUEST_THRESHOLD,
        }
    }
}

impl AnonymitySettings {
    /// `socks5://host:port`
    #[must_use]
    pub fn proxy_server(&self) -> String {
        format!("socks5://{}:{}", self.socks_host, self.socks_port)
    }
}

/// Browser session knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Navigation and wait-selector timeout per attempt
    pub page_timeout: Duration,
    /// Draw the baseline fingerprint at random instead of the first profile
    pub randomize_fingerprint: bool,
    /// Replaces the user agent of the deterministic fingerprint
    pub user_agent_override: Option<String>,
    /// Explicit Chrome/Chromium binary; found on PATH otherwise
    pub chrome_executable: Option<PathBuf>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            page_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            randomize_fingerprint: true,
            user_agent_override: None,
            chrome_executable: None,
        }
    }
}

/// Complete, validated configuration for one scraper process
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Output directory for persisted JSON
    pub(crate) storage_dir: PathBuf,
    pub(crate) retry: RetryPolicy,
    pub(crate) rate_limit: RateLimitSettings,
    pub(crate) crawl: CrawlOptions,
    pub(crate) anonymity: AnonymitySettings,
    pub(crate) browser: BrowserSettings,
}
