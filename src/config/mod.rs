//! Configuration module for scraping and crawling
//!
//! This module provides the `ScrapeConfig` struct, its type-safe builder and
//! the environment overrides, with validation and sensible defaults.

// Sub-modules
pub mod builder;
pub mod env;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{ScrapeConfigBuilder, WithStorageDir};
pub use types::{
    AnonymitySettings, BrowserSettings, CrawlOptions, RateLimitSettings, RetryPolicy, ScopeMode,
    ScrapeConfig,
};
