//! Environment overrides
//!
//! Recognised variables:
//!
//! | Variable | Effect |
//! |---|---|
//! | `SCRAPER_HEADLESS` | `1` headless, anything else headed |
//! | `SCRAPER_TIMEOUT_MS` | page timeout in milliseconds |
//! | `SCRAPER_PROXY` | `1` enables SOCKS routing |
//! | `SCRAPER_RANDOMIZE` | `1` random baseline fingerprint, anything else deterministic |
//! | `SCRAPER_UA` | user agent for the deterministic fingerprint |
//! | `TOR_SOCKS_HOST`, `TOR_SOCKS_PORT` | SOCKS endpoint |
//! | `TOR_CONTROL_PORT`, `TOR_CONTROL_PASSWORD` | control channel |
//! | `TOR_ROTATE_MIN_S` | minimum seconds between rotations |
//! | `TOR_ROTATE_REQ_THRESHOLD` | completed fetches required before rotating |
//!
//! The storage directory (`SCRAPER_STORAGE`) is resolved by the binary, since
//! it decides the builder's type state.

use std::str::FromStr;
use std::time::Duration;

use super::builder::ScrapeConfigBuilder;
use crate::crawl_engine::crawl_types::{ScrapeError, ScrapeResult};

fn flag(value: &str) -> bool {
    value.trim() == "1"
}

fn number<T: FromStr>(name: &str, value: &str) -> ScrapeResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ScrapeError::Config(format!("{name}={value:?} is not a valid number")))
}

impl<State> ScrapeConfigBuilder<State> {
    /// Apply overrides from the process environment
    ///
    /// # Errors
    /// `ScrapeError::Config` when a numeric variable does not parse.
    pub fn apply_env(self) -> ScrapeResult<Self> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary lookup
    ///
    /// # Errors
    /// `ScrapeError::Config` when a numeric variable does not parse.
    pub fn apply_env_from<F>(mut self, lookup: F) -> ScrapeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SCRAPER_HEADLESS") {
            self.browser.headless = flag(&v);
        }
        if let Some(v) = lookup("SCRAPER_TIMEOUT_MS") {
            self.browser.page_timeout = Duration::from_millis(number("SCRAPER_TIMEOUT_MS", &v)?);
        }
        if let Some(v) = lookup("SCRAPER_PROXY") {
            self.anonymity.proxy_enabled = flag(&v);
        }
        if let Some(v) = lookup("SCRAPER_RANDOMIZE") {
            self.browser.randomize_fingerprint = flag(&v);
        }
        if let Some(v) = lookup("SCRAPER_UA") {
            self = self.user_agent_override(Some(v));
        }
        if let Some(v) = lookup("TOR_SOCKS_HOST") {
            self.anonymity.socks_host = v;
        }
        if let Some(v) = lookup("TOR_SOCKS_PORT") {
            self.anonymity.socks_port = number("TOR_SOCKS_PORT", &v)?;
        }
        if let Some(v) = lookup("TOR_CONTROL_PORT") {
            self.anonymity.control_port = number("TOR_CONTROL_PORT", &v)?;
        }
        if let Some(v) = lookup("TOR_CONTROL_PASSWORD") {
            self = self.control_password(Some(v));
        }
        if let Some(v) = lookup("TOR_ROTATE_MIN_S") {
            self.anonymity.rotation_min_interval =
                Duration::from_secs(number("TOR_ROTATE_MIN_S", &v)?);
        }
        if let Some(v) = lookup("TOR_ROTATE_REQ_THRESHOLD") {
            self.anonymity.rotation_threshold = number("TOR_ROTATE_REQ_THRESHOLD", &v)?;
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ScrapeConfig;
    use std::collections::HashMap;
    use std::time::Duration;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn overrides_are_applied() {
        let config = ScrapeConfig::builder()
            .storage_dir("out")
            .apply_env_from(env(&[
                ("SCRAPER_HEADLESS", "0"),
                ("SCRAPER_TIMEOUT_MS", "30000"),
                ("SCRAPER_PROXY", "1"),
                ("SCRAPER_RANDOMIZE", "0"),
                ("SCRAPER_UA", "TestAgent/1.0"),
                ("TOR_SOCKS_HOST", "10.0.0.2"),
                ("TOR_SOCKS_PORT", "9150"),
                ("TOR_CONTROL_PORT", "9151"),
                ("TOR_CONTROL_PASSWORD", "hunter2"),
                ("TOR_ROTATE_MIN_S", "30"),
                ("TOR_ROTATE_REQ_THRESHOLD", "8"),
            ]))
            .unwrap()
            .build()
            .unwrap();

        assert!(!config.browser().headless);
        assert_eq!(config.browser().page_timeout, Duration::from_secs(30));
        assert!(!config.browser().randomize_fingerprint);
        assert_eq!(config.browser().user_agent_override.as_deref(), Some("TestAgent/1.0"));
        let anonymity = config.anonymity();
        assert!(anonymity.proxy_enabled);
        assert_eq!(anonymity.proxy_server(), "socks5://10.0.0.2:9150");
        assert_eq!(anonymity.control_port, 9151);
        assert_eq!(anonymity.control_password.as_deref(), Some("hunter2"));
        assert_eq!(anonymity.rotation_min_interval, Duration::from_secs(30));
        assert_eq!(anonymity.rotation_threshold, 8);
    }

    #[test]
    fn absent_variables_keep_defaults() {
        let config = ScrapeConfig::builder()
            .storage_dir("out")
            .apply_env_from(env(&[]))
            .unwrap()
            .build()
            .unwrap();
        assert!(config.browser().headless);
        assert!(config.browser().randomize_fingerprint);
        assert!(config.anonymity().control_password.is_none());
    }

    #[test]
    fn malformed_number_is_a_config_error() {
        let result = ScrapeConfig::builder().apply_env_from(env(&[("TOR_SOCKS_PORT", "socks")]));
        assert!(result.is_err());
    }
}
