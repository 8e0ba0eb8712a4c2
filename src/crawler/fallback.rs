//! Second-chance fetching for pages the primary fetcher was refused on
//!
//! Some result pages are only served to a real browser. [`FallbackFetcher`]
//! sends every page through its primary fetcher first and, when that ends in
//! a `Rejected` failure, makes exactly one round trip through the fallback.

use crate::config::FetcherConfig;
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::throttle::Clock;
use crate::state::{FailureKind, PageFetchResult};
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// Builds the fetcher a crawl of `site` runs with
///
/// Plain HTTP unless `browser-fallback` is set and the crate was built with
/// the `browser` feature, in which case refused pages get one headless
/// browser round trip through the same rate limiter.
pub fn build_page_fetcher(
    config: &FetcherConfig,
    site: &Url,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn PageFetcher>, reqwest::Error> {
    let http = HttpFetcher::new(config, site, clock)?;

    if !config.browser_fallback {
        return Ok(Arc::new(http));
    }

    #[cfg(feature = "browser")]
    {
        let browser = crate::crawler::browser::BrowserFetcher::new(config, site, http.limiter());
        tracing::info!("Headless browser fallback enabled");
        Ok(Arc::new(FallbackFetcher::new(
            Arc::new(http),
            Arc::new(browser),
        )))
    }

    #[cfg(not(feature = "browser"))]
    {
        tracing::warn!("browser-fallback is set but this build has no browser support");
        Ok(Arc::new(http))
    }
}

/// Tries `primary`, then `fallback` once for pages `primary` was refused on
///
/// Retryable failures are passed through untouched so the retry loop keeps
/// its backoff. Off-site redirects are never handed to the fallback. If the
/// fallback fails too, the primary's failure is reported with both reasons.
pub struct FallbackFetcher {
    primary: Arc<dyn PageFetcher>,
    fallback: Arc<dyn PageFetcher>,
}

impl FallbackFetcher {
    pub fn new(primary: Arc<dyn PageFetcher>, fallback: Arc<dyn PageFetcher>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl PageFetcher for FallbackFetcher {
    async fn fetch(&self, url: &Url) -> PageFetchResult {
        let first = self.primary.fetch(url).await;

        let reason = match &first {
            PageFetchResult::FatalFailure {
                kind: FailureKind::Rejected,
                reason,
            } => reason.clone(),
            _ => return first,
        };

        tracing::warn!("{} refused ({}), retrying with fallback fetcher", url, reason);

        match self.fallback.fetch(url).await {
            PageFetchResult::Success(body) => {
                tracing::info!("Fallback fetcher retrieved {}", url);
                PageFetchResult::Success(body)
            }
            PageFetchResult::FatalFailure {
                kind: FailureKind::OffsiteRedirect,
                reason: fallback_reason,
            } => PageFetchResult::fatal(FailureKind::OffsiteRedirect, fallback_reason),
            PageFetchResult::RetryableFailure(fallback_reason)
            | PageFetchResult::FatalFailure {
                reason: fallback_reason,
                ..
            } => PageFetchResult::fatal(
                FailureKind::Rejected,
                format!("{}; fallback: {}", reason, fallback_reason),
            ),
        }
    }
}
