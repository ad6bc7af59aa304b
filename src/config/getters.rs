//! Getter methods for `ScrapeConfig`

use std::path::PathBuf;

use super::types::{
    AnonymitySettings, BrowserSettings, CrawlOptions, RateLimitSettings, RetryPolicy,
    ScrapeConfig,
};

impl ScrapeConfig {
    #[must_use]
    pub fn storage_dir(&self) -> &PathBuf {
        &self.storage_dir
    }

    #[must_use]
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    #[must_use]
    pub fn rate_limit(&self) -> &RateLimitSettings {
        &self.rate_limit
    }

    #[must_use]
    pub fn crawl(&self) -> &CrawlOptions {
        &self.crawl
    }

    #[must_use]
    pub fn anonymity(&self) -> &AnonymitySettings {
        &self.anonymity
    }

    #[must_use]
    pub fn browser(&self) -> &BrowserSettings {
        &self.browser
    }
}
