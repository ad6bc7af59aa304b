//! Crawl Engine Module
//!
//! Everything between a URL and a persisted result: pacing, the escalating
//! fetch ladder, block detection, per-task orchestration and the
//! breadth-first crawl frontier.

// Sub-modules
pub mod block_detect;
pub mod crawl_types;
pub mod crawler;
pub mod escalation;
pub mod orchestrator;
pub mod page_timeout;
pub mod rate_limiter;

// Re-exports for public API
pub use block_detect::is_blocked;
pub use crawl_types::{
    AttemptResult, CleanedPage, FetchError, FetchTask, FrontierEntry, ScrapeError, ScrapeResult,
    TaskOutcome, TaskTemplate,
};
pub use crawler::{CrawlReport, CrawlScope, Crawler, UrlFilter};
pub use escalation::EscalatingFetchPolicy;
pub use orchestrator::{RunSummary, Scraper};
pub use rate_limiter::RateLimiter;
