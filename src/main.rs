// ghostcrawl: scrape or crawl URLs through an escalating, fingerprint-rotating
// Chromium session, optionally over Tor.

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use cli::Cli;
use ghostcrawl::anonymity::{CircuitRotator, SocksProxy, default_control};
use ghostcrawl::fingerprint::{FingerprintPool, log_summary};
use ghostcrawl::utils::constants::SOCKS_CONNECT_TIMEOUT;
use ghostcrawl::utils::{dedup_preserving_order, load_url_file};
use ghostcrawl::{
    ChromiumBackend, Crawler, EscalatingFetchPolicy, FetchBackend, JsonStorage, LogContext,
    RateLimiter, Scraper, Storage,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = (!cli.no_log_file).then_some(cli.log_dir.as_path());
    let logging = LogContext::init("info", log_dir)?;
    if let Some(path) = logging.log_file() {
        info!("Logging to {}", path.display());
    }

    let mut urls = cli.urls.clone();
    if let Some(path) = &cli.url_file {
        urls.extend(load_url_file(path)?);
    }
    let urls = dedup_preserving_order(urls);
    if urls.is_empty() {
        bail!("No URLs provided; pass URLs or --url-file");
    }

    let config = cli.to_config()?;
    let template = cli.template();

    let pool = FingerprintPool::new();
    let baseline = pool.baseline(
        config.browser().randomize_fingerprint,
        config.browser().user_agent_override.as_deref(),
        &mut rand::rng(),
    );
    log_summary(&baseline, config.browser().headless);

    let anonymity = config.anonymity();
    let (proxy_server, rotator) = if anonymity.proxy_enabled {
        SocksProxy::from_settings(anonymity)
            .require_reachable()
            .await
            .context("--use-proxy requires a reachable Tor SOCKS endpoint")?;
        let control = default_control(
            &anonymity.socks_host,
            anonymity.control_port,
            SOCKS_CONNECT_TIMEOUT,
        );
        let rotator = Arc::new(CircuitRotator::from_settings(control, anonymity));
        (Some(anonymity.proxy_server()), Some(rotator))
    } else {
        (None, None)
    };

    let backend: Arc<dyn FetchBackend> =
        Arc::new(ChromiumBackend::new(config.browser().clone(), proxy_server));

    let mut policy =
        EscalatingFetchPolicy::new(backend, pool, baseline, config.retry().clone());
    let limiter = RateLimiter::from_settings(config.rate_limit());
    if limiter.is_enabled() {
        policy = policy.with_rate_limiter(Arc::new(limiter));
    }
    if let Some(rotator) = &rotator {
        policy = policy.with_rotator(Arc::clone(rotator));
    }

    let storage: Arc<dyn Storage> = Arc::new(JsonStorage::new(config.storage_dir())?);
    let mut scraper = Scraper::new(policy, Arc::clone(&storage), config.browser().page_timeout);
    if let Some(rotator) = rotator {
        scraper = scraper.with_rotator(rotator);
    }
    let scraper = Arc::new(scraper);

    let outcome = if cli.crawl {
        let report = Crawler::new(Arc::clone(&scraper))
            .crawl(&urls, &template, config.crawl(), None)
            .await;
        if cli.aggregate {
            match serde_json::to_value(&report.pages) {
                Ok(payload) => {
                    let stem = format!("{}_aggregate", template.stem);
                    match storage.persist(payload, &stem).await {
                        Ok(location) => info!("Aggregated output saved: {}", location.display()),
                        Err(e) => error!("Failed to save aggregate: {e}"),
                    }
                }
                Err(e) => error!("Failed to serialize aggregate: {e}"),
            }
        }
        info!(
            "Crawl complete: {} pages saved, {} blocked, {} failed",
            report.pages.len(),
            report.blocked.len(),
            report.failures.len()
        );
        Ok(())
    } else {
        scraper
            .run_all(&urls, &template, config.retry().jitter, cli.aggregate)
            .await
            .map(|summary| {
                info!(
                    "Run complete: {}/{} saved, {} blocked, {} failed",
                    summary.saved.len(),
                    summary.total(),
                    summary.blocked.len(),
                    summary.failed.len()
                );
            })
    };

    scraper.close().await;
    outcome.map_err(Into::into)
}
