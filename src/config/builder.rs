//! Type-safe builder for `ScrapeConfig` using the typestate pattern
//!
//! `build()` only exists once a storage directory has been given; every
//! other knob has a default.

use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::{
    compile_patterns, AnonymitySettings, BrowserSettings, CrawlOptions, RateLimitSettings,
    RetryPolicy, ScopeMode, ScrapeConfig,
};
use crate::crawl_engine::crawl_types::{ScrapeError, ScrapeResult};
use crate::utils::constants::{DEFAULT_CONCURRENCY, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES};

// Type states for the builder
pub struct WithStorageDir;

pub struct ScrapeConfigBuilder<State = ()> {
    pub(crate) storage_dir: Option<PathBuf>,
    pub(crate) retry: RetryPolicy,
    pub(crate) rate_limit: RateLimitSettings,
    pub(crate) scope: ScopeMode,
    pub(crate) include_patterns: Vec<String>,
    pub(crate) exclude_patterns: Vec<String>,
    pub(crate) max_pages: usize,
    pub(crate) max_depth: u32,
    pub(crate) concurrency: usize,
    pub(crate) anonymity: AnonymitySettings,
    pub(crate) browser: BrowserSettings,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for ScrapeConfigBuilder<()> {
    fn default() -> Self {
        Self {
            storage_dir: None,
            retry: RetryPolicy::default(),
            rate_limit: RateLimitSettings::default(),
            scope: ScopeMode::default(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            max_pages: DEFAULT_MAX_PAGES,
            max_depth: DEFAULT_MAX_DEPTH,
            concurrency: DEFAULT_CONCURRENCY,
            anonymity: AnonymitySettings::default(),
            browser: BrowserSettings::default(),
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfig {
    /// Create a builder for configuring a `ScrapeConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> ScrapeConfigBuilder<()> {
        ScrapeConfigBuilder::default()
    }
}

impl ScrapeConfigBuilder<()> {
    pub fn storage_dir(self, dir: impl Into<PathBuf>) -> ScrapeConfigBuilder<WithStorageDir> {
        ScrapeConfigBuilder {
            storage_dir: Some(dir.into()),
            retry: self.retry,
            rate_limit: self.rate_limit,
            scope: self.scope,
            include_patterns: self.include_patterns,
            exclude_patterns: self.exclude_patterns,
            max_pages: self.max_pages,
            max_depth: self.max_depth,
            concurrency: self.concurrency,
            anonymity: self.anonymity,
            browser: self.browser,
            _phantom: PhantomData,
        }
    }
}

// Build method only available when all required fields are set
impl ScrapeConfigBuilder<WithStorageDir> {
    /// Validate and freeze the configuration
    ///
    /// # Errors
    /// `ScrapeError::Config` for zero attempts, zero concurrency, a zero page
    /// budget, a rate window without a length, or an invalid pattern.
    pub fn build(self) -> ScrapeResult<ScrapeConfig> {
        if self.retry.max_attempts == 0 {
            return Err(ScrapeError::Config("max_attempts must be at least 1".into()));
        }
        if self.concurrency == 0 {
            return Err(ScrapeError::Config("concurrency must be at least 1".into()));
        }
        if self.max_pages == 0 {
            return Err(ScrapeError::Config("max_pages must be at least 1".into()));
        }
        if self.rate_limit.max_per_interval.is_some() && self.rate_limit.interval.is_zero() {
            return Err(ScrapeError::Config(
                "rate interval must be positive when max_per_interval is set".into(),
            ));
        }

        let crawl = CrawlOptions {
            scope: self.scope,
            include: compile_patterns(&self.include_patterns)?,
            exclude: compile_patterns(&self.exclude_patterns)?,
            max_pages: self.max_pages,
            max_depth: self.max_depth,
            concurrency: self.concurrency,
        };

        Ok(ScrapeConfig {
            storage_dir: self
                .storage_dir
                .ok_or_else(|| ScrapeError::Config("storage_dir is required".into()))?,
            retry: self.retry,
            rate_limit: self.rate_limit,
            crawl,
            anonymity: self.anonymity,
            browser: self.browser,
        })
    }
}
