//! Chromium backend over the DevTools protocol
//!
//! One browser process is shared by every fetch. Each grab runs in its own
//! browser context (an incognito-like profile), so cookies and storage never
//! leak between fetches and concurrent grabs are isolated from each other.

use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetLocaleOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::{Browser, Page};
use futures::future::BoxFuture;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::FetchBackend;
use crate::browser_setup::{BrowserSession, launch_browser};
use crate::config::BrowserSettings;
use crate::crawl_engine::crawl_types::{FetchError, FetchTask};
use crate::crawl_engine::page_timeout::with_page_timeout;
use crate::fingerprint::ActiveFingerprint;
use crate::kromekover;
use crate::page_extractor::{PageSnapshot, collect_links, extract_all, wait_for_selector};

pub struct ChromiumBackend {
    settings: BrowserSettings,
    proxy_server: Option<String>,
    session: RwLock<Option<BrowserSession>>,
}

impl ChromiumBackend {
    /// Create a backend; the browser is launched on first use
    #[must_use]
    pub fn new(settings: BrowserSettings, proxy_server: Option<String>) -> Self {
        Self {
            settings,
            proxy_server,
            session: RwLock::new(None),
        }
    }

    async fn launch(&self) -> Result<BrowserSession, FetchError> {
        launch_browser(&self.settings, self.proxy_server.as_deref())
            .await
            .map_err(|e| FetchError::Session(format!("{e:#}")))
    }

    async fn ensure_session(&self) -> Result<(), FetchError> {
        if self.session.read().await.is_some() {
            return Ok(());
        }

        let mut session = self.session.write().await;
        if session.is_none() {
            info!("Launching Chromium session");
            *session = Some(self.launch().await?);
        }
        Ok(())
    }

    async fn grab_page(
        &self,
        task: &FetchTask,
        fingerprint: &ActiveFingerprint,
        timeout: Duration,
        gather_links: bool,
    ) -> Result<PageSnapshot, FetchError> {
        self.ensure_session().await?;

        let guard = self.session.read().await;
        let session = guard
            .as_ref()
            .ok_or_else(|| FetchError::Session("browser session closed".into()))?;
        let browser = &session.browser;

        let context_id = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| FetchError::Session(format!("create browser context: {e}")))?
            .result
            .browser_context_id;

        let result =
            grab_in_context(browser, context_id.clone(), task, fingerprint, timeout, gather_links)
                .await;

        if let Err(e) = browser
            .execute(DisposeBrowserContextParams::new(context_id))
            .await
        {
            debug!("Failed to dispose browser context: {e}");
        }

        result
    }
}

async fn grab_in_context(
    browser: &Browser,
    context_id: BrowserContextId,
    task: &FetchTask,
    fingerprint: &ActiveFingerprint,
    timeout: Duration,
    gather_links: bool,
) -> Result<PageSnapshot, FetchError> {
    let target = CreateTargetParams::builder()
        .url("about:blank")
        .browser_context_id(context_id)
        .build()
        .map_err(FetchError::Session)?;

    let page = browser
        .new_page(target)
        .await
        .map_err(|e| FetchError::Session(format!("open page: {e}")))?;

    let result = read_page(&page, task, fingerprint, timeout, gather_links).await;

    if let Err(e) = page.close().await {
        debug!("Failed to close page for {}: {e}", task.url);
    }

    result
}

/// Present `fingerprint` on a blank page before any navigation
async fn apply_fingerprint(page: &Page, fingerprint: &ActiveFingerprint) -> Result<(), FetchError> {
    kromekover::inject(page, fingerprint)
        .await
        .map_err(|e| FetchError::Session(format!("{e:#}")))?;

    let metrics = SetDeviceMetricsOverrideParams::builder()
        .width(i64::from(fingerprint.viewport.width))
        .height(i64::from(fingerprint.viewport.height))
        .device_scale_factor(if fingerprint.device_class.is_mobile() { 3.0 } else { 1.0 })
        .mobile(fingerprint.device_class.is_mobile())
        .build()
        .map_err(FetchError::Session)?;
    page.execute(metrics)
        .await
        .map_err(|e| FetchError::Session(format!("device metrics: {e}")))?;

    // Unknown zones or locales are rejected by Chrome; the attempt goes on
    if let Err(e) = page
        .execute(SetTimezoneOverrideParams::new(fingerprint.timezone.clone()))
        .await
    {
        warn!("Timezone override '{}' rejected: {e}", fingerprint.timezone);
    }
    if let Err(e) = page
        .execute(SetLocaleOverrideParams {
            locale: Some(fingerprint.locale.clone()),
        })
        .await
    {
        warn!("Locale override '{}' rejected: {e}", fingerprint.locale);
    }

    Ok(())
}

async fn read_page(
    page: &Page,
    task: &FetchTask,
    fingerprint: &ActiveFingerprint,
    timeout: Duration,
    gather_links: bool,
) -> Result<PageSnapshot, FetchError> {
    apply_fingerprint(page, fingerprint).await?;

    with_page_timeout(
        async {
            page.goto(task.url.as_str())
                .await
                .map(|_| ())
                .map_err(|e| FetchError::Navigation(e.to_string()))
        },
        timeout,
        "navigation",
    )
    .await?;

    if let Some(selector) = &task.wait_selector {
        wait_for_selector(page, selector, timeout).await?;
    }

    let raw_html = page
        .content()
        .await
        .map_err(|e| FetchError::Extraction(e.to_string()))?;

    let records = extract_all(page, &task.selectors, timeout).await;

    let links = if gather_links {
        collect_links(page).await.unwrap_or_else(|e| {
            warn!("Link collection failed on {}: {e:#}", task.url);
            Vec::new()
        })
    } else {
        Vec::new()
    };

    Ok(PageSnapshot {
        records,
        links,
        raw_html,
    })
}

impl FetchBackend for ChromiumBackend {
    fn engine_name(&self) -> &'static str {
        "chromium"
    }

    fn supports_concurrency(&self) -> bool {
        true
    }

    fn grab<'a>(
        &'a self,
        task: &'a FetchTask,
        fingerprint: &'a ActiveFingerprint,
        timeout: Duration,
        gather_links: bool,
    ) -> BoxFuture<'a, Result<PageSnapshot, FetchError>> {
        Box::pin(self.grab_page(task, fingerprint, timeout, gather_links))
    }

    fn relaunch(&self) -> BoxFuture<'_, Result<(), FetchError>> {
        Box::pin(async move {
            let mut session = self.session.write().await;
            if let Some(old) = session.take() {
                info!("Relaunching Chromium session");
                old.close().await;
            }
            *session = Some(self.launch().await?);
            Ok(())
        })
    }

    fn shutdown(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if let Some(session) = self.session.write().await.take() {
                info!("Shutting down Chromium session");
                session.close().await;
            }
        })
    }
}
