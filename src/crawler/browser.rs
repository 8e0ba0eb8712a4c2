//! Headless browser fetcher
//!
//! Renders result pages in headless Chromium for sites that refuse the plain
//! HTTP client. The browser is launched on first use and shared by every
//! later fetch; requests wait on the same [`RateLimiter`] as the HTTP fetcher.

use crate::config::FetcherConfig;
use crate::crawler::fetcher::{is_same_site, PageFetcher};
use crate::crawler::throttle::RateLimiter;
use crate::state::{FailureKind, PageFetchResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder};
use chromiumoxide::error::CdpError;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

/// Errors from driving the browser
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("invalid browser configuration: {0}")]
    Config(String),

    #[error("browser error: {0}")]
    Cdp(#[from] CdpError),
}

/// A running browser and the task draining its event stream
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// A rendered page and the address it settled on
struct RenderedPage {
    html: String,
    final_url: Option<String>,
}

/// Fetches pages by loading them in headless Chromium
pub struct BrowserFetcher {
    user_agent: String,
    timeout: Duration,
    limiter: Arc<RateLimiter>,
    site_host: String,
    session: Mutex<Option<BrowserSession>>,
}

impl BrowserFetcher {
    /// Creates a fetcher for `site`; no browser is started until the first fetch
    pub fn new(config: &FetcherConfig, site: &Url, limiter: Arc<RateLimiter>) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            limiter,
            site_host: site.host_str().unwrap_or_default().to_string(),
            session: Mutex::new(None),
        }
    }

    async fn launch(&self) -> Result<BrowserSession, BrowserError> {
        let config = BrowserConfigBuilder::default()
            .request_timeout(self.timeout)
            .arg(format!("--user-agent={}", self.user_agent))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .arg("--mute-audio")
            .build()
            .map_err(BrowserError::Config)?;

        tracing::info!("Launching headless browser");
        let (browser, mut handler) = Browser::launch(config).await?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {}", e);
                }
            }
            tracing::debug!("Browser event handler finished");
        });

        Ok(BrowserSession { browser, handler })
    }

    async fn render(&self, url: &Url) -> Result<RenderedPage, BrowserError> {
        let mut session = self.session.lock().await;
        if session.is_none() {
            *session = Some(self.launch().await?);
        }
        let Some(active) = session.as_ref() else {
            return Err(BrowserError::Config("browser session unavailable".to_string()));
        };

        let page = active.browser.new_page("about:blank").await?;
        let rendered = async {
            page.goto(url.as_str()).await?;
            page.wait_for_navigation().await?;
            let final_url = page.url().await?;
            let html = page.content().await?;
            Ok::<_, CdpError>(RenderedPage { html, final_url })
        }
        .await;

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close browser page: {}", e);
        }

        if rendered.is_err() {
            // Relaunch on the next fetch in case the browser went away
            *session = None;
        }

        Ok(rendered?)
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &Url) -> PageFetchResult {
        self.limiter.acquire().await;
        tracing::debug!("BROWSER GET {}", url);

        let rendered = match tokio::time::timeout(self.timeout, self.render(url)).await {
            Ok(Ok(rendered)) => rendered,
            Ok(Err(BrowserError::Config(reason))) => {
                return PageFetchResult::fatal(FailureKind::Rejected, reason)
            }
            Ok(Err(e)) => return PageFetchResult::RetryableFailure(e.to_string()),
            Err(_) => {
                return PageFetchResult::RetryableFailure("browser navigation timed out".into())
            }
        };

        let landed = rendered
            .final_url
            .as_deref()
            .and_then(|u| Url::parse(u).ok());
        if let Some(landed) = landed {
            if !is_same_site(landed.host_str(), &self.site_host) {
                return PageFetchResult::fatal(
                    FailureKind::OffsiteRedirect,
                    format!("landed off-site at {}", landed),
                );
            }
        }

        PageFetchResult::Success(rendered.html)
    }
}
