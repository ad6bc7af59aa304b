//! Selector-driven extraction from a live page
//!
//! Every function here operates on an already navigated chromiumoxide page.
//! Failures are contained per selector so one bad selector never costs the
//! rest of the page.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::schema::{PageRecord, SelectorRecords};
use crate::cleaner::collapse_whitespace;
use crate::crawl_engine::crawl_types::FetchError;

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Poll until `selector` matches at least one element
///
/// # Errors
/// `FetchError::Timeout` when nothing matched within `timeout`.
pub async fn wait_for_selector(
    page: &Page,
    selector: &str,
    timeout: Duration,
) -> Result<(), FetchError> {
    let start = Instant::now();

    loop {
        if let Ok(elements) = page.find_elements(selector).await
            && !elements.is_empty()
        {
            debug!(
                "Wait selector '{selector}' present after {:.2}s",
                start.elapsed().as_secs_f64()
            );
            return Ok(());
        }

        if start.elapsed() >= timeout {
            return Err(FetchError::Timeout {
                operation: format!("wait for '{selector}'"),
                millis: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            });
        }

        tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
    }
}

/// Extract text and markup for every element matching `selector`
pub async fn extract_records(page: &Page, selector: &str) -> Result<Vec<PageRecord>> {
    let elements = page
        .find_elements(selector)
        .await
        .with_context(|| format!("Failed to query selector '{selector}'"))?;

    let mut records = Vec::with_capacity(elements.len());
    for element in elements {
        let text = element.inner_text().await.ok().flatten().unwrap_or_default();
        let html = element.inner_html().await.ok().flatten().unwrap_or_default();
        let record = PageRecord::new(collapse_whitespace(&text), html);
        if !record.is_empty() {
            records.push(record);
        }
    }

    Ok(records)
}

/// Run every selector, isolating failures and timeouts per selector
///
/// A selector that errors or exceeds `timeout` maps to an empty list.
pub async fn extract_all(
    page: &Page,
    selectors: &[String],
    timeout: Duration,
) -> SelectorRecords {
    let mut data = SelectorRecords::with_capacity(selectors.len());

    for selector in selectors {
        let records = match tokio::time::timeout(timeout, extract_records(page, selector)).await {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => {
                warn!("Selector '{selector}' failed: {e:#}");
                Vec::new()
            }
            Err(_) => {
                warn!("Selector '{selector}' timed out after {timeout:?}");
                Vec::new()
            }
        };
        data.insert(selector.clone(), records);
    }

    data
}

/// Collect raw `href` attributes of every anchor on the page
pub async fn collect_links(page: &Page) -> Result<Vec<String>> {
    let anchors = page
        .find_elements("a")
        .await
        .context("Failed to query anchors")?;

    let mut links = Vec::with_capacity(anchors.len());
    for anchor in anchors {
        if let Ok(Some(href)) = anchor.attribute("href").await {
            let href = href.trim();
            if !href.is_empty() {
                links.push(href.to_string());
            }
        }
    }

    Ok(links)
}
