//! Shared configuration constants for ghostcrawl
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

use std::time::Duration;

/// Default page timeout: 15 seconds
///
/// Applied to navigation and to the optional wait-selector. A page that has
/// not produced its wait element by then counts as a transient failure.
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Default maximum crawl depth: 2 levels
pub const DEFAULT_MAX_DEPTH: u32 = 2;

/// Default page budget for a crawl run
pub const DEFAULT_MAX_PAGES: usize = 50;

/// Default number of in-flight fetches
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Default retry ladder length (1 = no escalation)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// Fixed pause between escalation attempts
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Inter-task pacing jitter
pub const DEFAULT_JITTER: Duration = Duration::from_millis(500);

/// Pause after a forced circuit rotation so the new circuit can settle
///
/// Tor builds the replacement circuit lazily; fetching immediately after
/// NEWNYM frequently lands on the old exit.
pub const DEFAULT_CIRCUIT_SETTLE: Duration = Duration::from_secs(3);

/// Rolling window used when only a max-per-interval is configured
pub const DEFAULT_RATE_INTERVAL: Duration = Duration::from_secs(1);

/// Tor defaults
pub const DEFAULT_TOR_HOST: &str = "127.0.0.1";
pub const DEFAULT_TOR_SOCKS_PORT: u16 = 9050;
pub const DEFAULT_TOR_CONTROL_PORT: u16 = 9051;

/// Minimum time between two circuit rotations
pub const DEFAULT_ROTATION_MIN_INTERVAL: Duration = Duration::from_secs(10);

/// Completed fetches required before a circuit rotation is allowed
pub const DEFAULT_ROTATION_REQUEST_THRESHOLD: u64 = 5;

/// Connect timeout for the SOCKS reachability check
pub const SOCKS_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default output directory for persisted results
pub const DEFAULT_STORAGE_DIR: &str = "data";

/// Default filename stem for persisted results
pub const DEFAULT_STEM: &str = "scrape";

/// Page content signatures that identify anti-bot interstitials
///
/// Matched case-insensitively as plain substrings against the raw HTML.
/// Entries must be lowercase.
pub const BLOCK_SIGNATURES: &[&str] = &[
    // Cloudflare
    "cf-browser-verification",
    "cf-challenge",
    "cf_chl_opt",
    "challenge-platform",
    "checking your browser before accessing",
    "attention required! | cloudflare",
    // Generic CAPTCHA providers
    "g-recaptcha",
    "h-captcha",
    "hcaptcha.com",
    "captcha-delivery.com",
    "are you a robot",
    "verify you are human",
    // Generic denials
    "access denied",
    "request blocked",
    "unusual traffic from your computer",
];
