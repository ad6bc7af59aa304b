//! Command-line interface

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use ghostcrawl::config::{ScopeMode, ScrapeConfig};
use ghostcrawl::utils::constants::{DEFAULT_STEM, DEFAULT_STORAGE_DIR};
use ghostcrawl::{ScrapeResult, TaskTemplate};

#[derive(Parser, Debug)]
#[command(
    name = "ghostcrawl",
    version,
    about = "Polite, evasive scraper with fingerprint rotation and Tor circuit escalation"
)]
pub struct Cli {
    /// One or more URLs (optional if --url-file is used)
    pub urls: Vec<String>,

    /// CSS selector to extract (repeat for several)
    #[arg(short = 's', long = "selector", required = true)]
    pub selectors: Vec<String>,

    /// Selector to wait for before extraction
    #[arg(long)]
    pub wait: Option<String>,

    /// File with newline-separated URLs; blank lines and `#` comments ignored
    #[arg(long)]
    pub url_file: Option<PathBuf>,

    /// Base filename stem for outputs
    #[arg(long, default_value = DEFAULT_STEM)]
    pub stem: String,

    /// Output directory
    #[arg(long, env = "SCRAPER_STORAGE", default_value = DEFAULT_STORAGE_DIR)]
    pub storage: PathBuf,

    /// Also save one aggregated JSON of all results
    #[arg(long)]
    pub aggregate: bool,

    /// Route traffic through the Tor SOCKS proxy (fails if unreachable)
    #[arg(long)]
    pub use_proxy: bool,

    /// Use the deterministic baseline fingerprint
    #[arg(long)]
    pub no_random: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Page timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Total attempts per URL
    #[arg(long, default_value_t = 1)]
    pub retries: u32,

    /// Seconds between attempts
    #[arg(long, default_value_t = 2.0)]
    pub retry_delay: f64,

    /// Seconds of random pacing between tasks (pause is jitter + U(0, jitter))
    #[arg(long, default_value_t = 0.5)]
    pub jitter: f64,

    /// Relaunch the browser before each retry
    #[arg(long)]
    pub fresh_session: bool,

    /// Force a circuit rotation before each retry
    #[arg(long)]
    pub rotate_on_retry: bool,

    /// Switch to a different user agent before each retry
    #[arg(long)]
    pub rerandomize: bool,

    /// Seconds to wait after a forced rotation
    #[arg(long, default_value_t = 3.0)]
    pub circuit_settle: f64,

    /// Follow links breadth-first from the given URLs
    #[arg(long)]
    pub crawl: bool,

    #[arg(long, default_value_t = 50)]
    pub max_pages: usize,

    #[arg(long, default_value_t = 2)]
    pub max_depth: u32,

    #[arg(long, value_enum, default_value_t = ScopeArg::SameHost)]
    pub scope: ScopeArg,

    /// Regex a crawled URL must match (repeatable; any one suffices)
    #[arg(long = "include")]
    pub include: Vec<String>,

    /// Regex that excludes a URL (repeatable)
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,

    /// Concurrent fetches per crawl batch
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,

    /// Maximum fetches per rate interval
    #[arg(long)]
    pub rate_max: Option<u32>,

    /// Rate interval in seconds
    #[arg(long, default_value_t = 1.0)]
    pub rate_interval: f64,

    /// Minimum seconds between fetches
    #[arg(long, default_value_t = 0.0)]
    pub min_delay: f64,

    /// Directory for ghostcrawl.log
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,

    /// Log to stderr only
    #[arg(long)]
    pub no_log_file: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    SameHost,
    Subdomains,
    CrossDomain,
}

impl From<ScopeArg> for ScopeMode {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::SameHost => Self::SameHost,
            ScopeArg::Subdomains => Self::Subdomains,
            ScopeArg::CrossDomain => Self::CrossDomain,
        }
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::ZERO)
}

impl Cli {
    /// Environment first, then explicit flags on top
    pub fn to_config(&self) -> ScrapeResult<ScrapeConfig> {
        let mut builder = ScrapeConfig::builder()
            .storage_dir(&self.storage)
            .apply_env()?
            .max_attempts(self.retries)
            .retry_backoff(seconds(self.retry_delay))
            .jitter(seconds(self.jitter))
            .fresh_session_on_retry(self.fresh_session)
            .force_rotation_on_retry(self.rotate_on_retry)
            .rerandomize_on_retry(self.rerandomize)
            .circuit_settle(seconds(self.circuit_settle))
            .min_delay(seconds(self.min_delay))
            .scope(self.scope.into())
            .include_patterns(self.include.iter().cloned())
            .exclude_patterns(self.exclude.iter().cloned())
            .max_pages(self.max_pages)
            .max_depth(self.max_depth)
            .concurrency(self.concurrency);

        if let Some(max) = self.rate_max {
            builder = builder.rate_limit(max, seconds(self.rate_interval));
        }
        if self.use_proxy {
            builder = builder.proxy_enabled(true);
        }
        if self.no_random {
            builder = builder.randomize_fingerprint(false);
        }
        if self.headed {
            builder = builder.headless(false);
        }
        if let Some(ms) = self.timeout_ms {
            builder = builder.page_timeout(Duration::from_millis(ms));
        }

        builder.build()
    }

    pub fn template(&self) -> TaskTemplate {
        TaskTemplate::new(self.selectors.iter().cloned(), self.wait.clone(), self.stem.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::parse_from([
            "ghostcrawl",
            "https://example.com",
            "-s",
            "h1",
            "-s",
            "h1",
            "--retries",
            "3",
            "--rerandomize",
            "--crawl",
            "--scope",
            "subdomains",
            "--rate-max",
            "3",
            "--no-random",
        ]);

        let config = cli.to_config().unwrap();
        assert_eq!(config.retry().max_attempts, 3);
        assert!(config.retry().rerandomize_fingerprint);
        assert_eq!(config.crawl().scope, ScopeMode::Subdomains);
        assert_eq!(config.rate_limit().max_per_interval, Some(3));
        assert!(!config.browser().randomize_fingerprint);
        assert_eq!(cli.template().selectors, vec!["h1"]);
    }
}
