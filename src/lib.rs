pub mod anonymity;
pub mod backend;
pub mod browser_profile;
pub mod browser_setup;
pub mod cleaner;
pub mod config;
pub mod content_saver;
pub mod crawl_engine;
pub mod fingerprint;
pub mod kromekover;
pub mod logging;
pub mod page_extractor;
pub mod utils;

pub use anonymity::{CircuitControl, CircuitRotator, RotationError, SocksProxy};
pub use backend::{ChromiumBackend, FetchBackend};
pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use config::{ScopeMode, ScrapeConfig};
pub use content_saver::{JsonStorage, Storage};
pub use crawl_engine::{
    AttemptResult, CleanedPage, CrawlReport, Crawler, EscalatingFetchPolicy, FetchError,
    FetchTask, RateLimiter, RunSummary, ScrapeError, ScrapeResult, Scraper, TaskOutcome,
    TaskTemplate,
};
pub use fingerprint::{ActiveFingerprint, FingerprintPool};
pub use logging::LogContext;
pub use page_extractor::schema::*;
