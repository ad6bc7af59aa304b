//! Breadth-first crawl frontier
//!
//! The frontier is a strict FIFO of `(url, depth)` entries. Each round takes
//! up to `concurrency` entries, fetches them concurrently, then appends the
//! newly discovered links in batch order. Because appends always go to the
//! back, the visit order does not depend on the concurrency level.

use futures::future::join_all;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use super::crawl_types::{
    CleanedPage, FetchTask, FrontierEntry, ScrapeError, ScrapeResult, TaskOutcome, TaskTemplate,
};
use super::orchestrator::Scraper;
use super::rate_limiter::RateLimiter;
use crate::config::{CrawlOptions, ScopeMode};
use crate::utils::{normalize_url, registrable_suffix, resolve_link};

/// Host restriction derived from the first seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlScope {
    mode: ScopeMode,
    seed_host: String,
    suffix: String,
}

impl CrawlScope {
    /// Scope anchored at `seed`'s host; `None` if the seed has no host
    #[must_use]
    pub fn from_seed(seed: &str, mode: ScopeMode) -> Option<Self> {
        let url = Url::parse(seed).ok()?;
        let seed_host = url.host_str()?.to_ascii_lowercase();
        let suffix = registrable_suffix(&seed_host);
        Some(Self {
            mode,
            seed_host,
            suffix,
        })
    }

    #[must_use]
    pub fn allows_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        match self.mode {
            ScopeMode::CrossDomain => true,
            ScopeMode::SameHost => host == self.seed_host,
            ScopeMode::Subdomains => {
                host == self.suffix || host.ends_with(&format!(".{}", self.suffix))
            }
        }
    }
}

/// Combined scheme, pattern and scope check for candidate URLs
#[derive(Debug, Clone)]
pub struct UrlFilter {
    scope: CrawlScope,
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl UrlFilter {
    #[must_use]
    pub fn new(scope: CrawlScope, options: &CrawlOptions) -> Self {
        Self {
            scope,
            include: options.include.clone(),
            exclude: options.exclude.clone(),
        }
    }

    /// Whether `url` may be crawled
    ///
    /// Requires http(s), no exclude match, at least one include match when
    /// includes exist, and a host inside the scope.
    #[must_use]
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }
        if self.exclude.iter().any(|re| re.is_match(url)) {
            return false;
        }
        if !self.include.is_empty() && !self.include.iter().any(|re| re.is_match(url)) {
            return false;
        }
        parsed
            .host_str()
            .is_some_and(|host| self.scope.allows_host(host))
    }
}

/// Everything a crawl produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlReport {
    /// Normalized URL to cleaned page, blocked pages included
    pub pages: BTreeMap<String, CleanedPage>,
    /// URLs in the order they were taken off the frontier
    pub visited: Vec<String>,
    /// URL and reason for every page that produced nothing
    pub failures: Vec<(String, String)>,
    /// URLs whose terminal attempt was still blocked
    pub blocked: Vec<String>,
}

pub struct Crawler {
    scraper: Arc<Scraper>,
}

impl Crawler {
    #[must_use]
    pub fn new(scraper: Arc<Scraper>) -> Self {
        Self { scraper }
    }

    /// Crawl breadth-first from `seeds`
    ///
    /// `rate_limiter` gates each dispatch; pass `None` when the scraper's
    /// fetch policy already paces its attempts.
    pub async fn crawl(
        &self,
        seeds: &[String],
        template: &TaskTemplate,
        options: &CrawlOptions,
        rate_limiter: Option<&RateLimiter>,
    ) -> CrawlReport {
        let mut report = CrawlReport::default();

        let mut normalized_seeds = Vec::with_capacity(seeds.len());
        for seed in seeds {
            match normalize_url(seed) {
                Some(normalized) => normalized_seeds.push(normalized),
                None => {
                    let e = ScrapeError::InvalidUrl(seed.clone());
                    warn!("[CRAWL] Skipping seed: {e}");
                    report.failures.push((seed.clone(), e.to_string()));
                }
            }
        }
        let seeds = normalized_seeds;

        let Some(scope) = seeds
            .first()
            .and_then(|seed| CrawlScope::from_seed(seed, options.scope))
        else {
            return report;
        };
        let filter = UrlFilter::new(scope, options);

        let concurrency = if self.scraper.supports_concurrency() {
            options.concurrency.max(1)
        } else {
            if options.concurrency > 1 {
                warn!("[CRAWL] Backend is single-session; concurrency clamped to 1");
            }
            1
        };

        let mut visited: HashSet<String> = HashSet::new();
        let mut enqueued: HashSet<String> = HashSet::new();
        let mut frontier: VecDeque<FrontierEntry> = VecDeque::new();

        for seed in seeds {
            if filter.is_allowed(&seed) && enqueued.insert(seed.clone()) {
                frontier.push_back(FrontierEntry { url: seed, depth: 0 });
            }
        }

        while visited.len() < options.max_pages {
            let mut batch = Vec::with_capacity(concurrency);
            while batch.len() < concurrency && visited.len() < options.max_pages {
                let Some(entry) = frontier.pop_front() else {
                    break;
                };
                if !visited.insert(entry.url.clone()) {
                    continue;
                }
                info!(
                    "[CRAWL] Depth {} ({}/{}): {}",
                    entry.depth,
                    visited.len(),
                    options.max_pages,
                    entry.url
                );
                report.visited.push(entry.url.clone());
                batch.push(entry);
            }

            if batch.is_empty() {
                break;
            }

            let results = join_all(batch.iter().map(|entry| {
                self.fetch_entry(entry, template, options.max_depth, rate_limiter)
            }))
            .await;

            for (entry, result) in batch.into_iter().zip(results) {
                let links = match result {
                    Ok(outcome) => {
                        if let Some(error) = &outcome.error {
                            warn!("[CRAWL] Error {}: {error}", entry.url);
                            report.failures.push((entry.url.clone(), error.to_string()));
                            continue;
                        }
                        if outcome.page.blocked {
                            report.blocked.push(entry.url.clone());
                        }
                        report.pages.insert(entry.url.clone(), outcome.page);
                        outcome.links
                    }
                    Err(e) => {
                        warn!("[CRAWL] Error {}: {e}", entry.url);
                        report.failures.push((entry.url.clone(), e.to_string()));
                        continue;
                    }
                };

                if entry.depth >= options.max_depth {
                    continue;
                }

                let Ok(base) = Url::parse(&entry.url) else {
                    continue;
                };
                for link in links {
                    if let Some(full) = resolve_link(&base, &link)
                        && !visited.contains(&full)
                        && filter.is_allowed(&full)
                        && enqueued.insert(full.clone())
                    {
                        frontier.push_back(FrontierEntry {
                            url: full,
                            depth: entry.depth + 1,
                        });
                    }
                }
            }
        }

        info!(
            "[CRAWL] Finished: {} visited, {} saved, {} blocked, {} failed",
            report.visited.len(),
            report.pages.len(),
            report.blocked.len(),
            report.failures.len()
        );
        report
    }

    async fn fetch_entry(
        &self,
        entry: &FrontierEntry,
        template: &TaskTemplate,
        max_depth: u32,
        rate_limiter: Option<&RateLimiter>,
    ) -> ScrapeResult<TaskOutcome> {
        if let Some(limiter) = rate_limiter {
            limiter.acquire().await;
        }
        let task = FetchTask::new(entry.url.clone(), template);
        self.scraper.run_task(&task, entry.depth < max_depth).await
    }
}
