//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with browser-like headers
//! - Rate limiting every request through a shared [`RateLimiter`]
//! - Refusing redirects that leave the target site
//! - Error classification into retryable and fatal failures

use crate::config::FetcherConfig;
use crate::crawler::throttle::{Clock, RateLimiter};
use crate::state::{FailureKind, PageFetchResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, LOCATION, REFERER};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Maximum number of same-site redirects followed for one request
const MAX_REDIRECTS: usize = 10;

/// Retrieves the raw HTML of one search results page
///
/// Implementations perform exactly one round trip per call; retrying is the
/// caller's job (see [`fetch_with_retry`](crate::crawler::fetch_with_retry)).
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> PageFetchResult;
}

/// Builds an HTTP client for the given site
///
/// Redirects are followed only while they stay on `site`'s host (or one of
/// its subdomains); anything else is stopped and reported by the fetcher.
///
/// # Example
///
/// ```no_run
/// use internship_scout::config::FetcherConfig;
/// use internship_scout::crawler::build_http_client;
/// use url::Url;
///
/// let site = Url::parse("https://internshala.com/").unwrap();
/// let client = build_http_client(&FetcherConfig::default(), &site).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig, site: &Url) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    if let Ok(referer) = HeaderValue::from_str(site.as_str()) {
        headers.insert(REFERER, referer);
    }

    let site_host = site.host_str().unwrap_or_default().to_string();
    let redirect_policy = Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if is_same_site(attempt.url().host_str(), &site_host) {
            attempt.follow()
        } else {
            attempt.stop()
        }
    });

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(redirect_policy)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true if `host` belongs to the site rooted at `site_host`
///
/// `www.` variants and other subdomains count as the same site.
pub fn is_same_site(host: Option<&str>, site_host: &str) -> bool {
    let Some(host) = host else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    let site_host = site_host.to_ascii_lowercase();
    let site_root = site_host.strip_prefix("www.").unwrap_or(&site_host);

    host == site_host || host == site_root || host.ends_with(&format!(".{}", site_root))
}

/// Maps a response status to a fetch failure
///
/// Returns `None` for success statuses.
///
/// | Status | Result |
/// |--------|--------|
/// | 2xx | `None` |
/// | 408, 429, 5xx | `RetryableFailure` |
/// | anything else | `FatalFailure(Rejected)` |
pub fn classify_status(status: StatusCode) -> Option<PageFetchResult> {
    if status.is_success() {
        return None;
    }

    let reason = format!("HTTP {}", status.as_u16());
    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        Some(PageFetchResult::RetryableFailure(reason))
    } else {
        Some(PageFetchResult::fatal(FailureKind::Rejected, reason))
    }
}

/// Maps a transport-level error to a fetch failure
fn classify_request_error(error: &reqwest::Error) -> PageFetchResult {
    if error.is_redirect() {
        PageFetchResult::fatal(FailureKind::Rejected, format!("redirect error: {}", error))
    } else if error.is_builder() {
        PageFetchResult::fatal(FailureKind::Rejected, format!("invalid request: {}", error))
    } else if error.is_timeout() {
        PageFetchResult::RetryableFailure("request timeout".to_string())
    } else if error.is_connect() {
        PageFetchResult::RetryableFailure(format!("connection failed: {}", error))
    } else {
        PageFetchResult::RetryableFailure(error.to_string())
    }
}

/// Fetches pages over HTTP with a minimum delay between requests
pub struct HttpFetcher {
    client: Client,
    limiter: Arc<RateLimiter>,
    site_host: String,
}

impl HttpFetcher {
    /// Creates a fetcher for `site` using the given configuration and clock
    pub fn new(
        config: &FetcherConfig,
        site: &Url,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, reqwest::Error> {
        let limiter = RateLimiter::new(Duration::from_millis(config.min_delay_ms), clock);
        Self::with_limiter(config, site, Arc::new(limiter))
    }

    /// Creates a fetcher that spaces its requests through an existing limiter
    pub fn with_limiter(
        config: &FetcherConfig,
        site: &Url,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config, site)?;
        tracing::debug!(
            "HTTP fetcher for {} spaces requests {:?} apart",
            site,
            limiter.min_interval()
        );

        Ok(Self {
            client,
            limiter,
            site_host: site.host_str().unwrap_or_default().to_string(),
        })
    }

    /// The limiter every request from this fetcher waits on
    pub fn limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> PageFetchResult {
        self.limiter.acquire().await;
        tracing::debug!("GET {}", url);

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return classify_request_error(&e),
        };

        let status = response.status();

        // The redirect policy stops at the first off-site hop, leaving a 3xx here
        if status.is_redirection() {
            let target = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("<missing location>");
            return PageFetchResult::fatal(
                FailureKind::OffsiteRedirect,
                format!("redirected off-site to {}", target),
            );
        }

        if !is_same_site(response.url().host_str(), &self.site_host) {
            return PageFetchResult::fatal(
                FailureKind::OffsiteRedirect,
                format!("landed off-site at {}", response.url()),
            );
        }

        if let Some(failure) = classify_status(status) {
            return failure;
        }

        match response.text().await {
            Ok(body) => PageFetchResult::Success(body),
            Err(e) => PageFetchResult::RetryableFailure(format!("failed to read body: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::throttle::ManualClock;

    fn site() -> Url {
        Url::parse("https://internshala.com/").unwrap()
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&FetcherConfig::default(), &site());
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_http_fetcher() {
        let fetcher = HttpFetcher::new(
            &FetcherConfig::default(),
            &site(),
            Arc::new(ManualClock::new()),
        );
        assert!(fetcher.is_ok());
    }

    #[test]
    fn test_fetchers_can_share_a_limiter() {
        let clock = Arc::new(ManualClock::new());
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(2), clock));
        let fetcher =
            HttpFetcher::with_limiter(&FetcherConfig::default(), &site(), Arc::clone(&limiter))
                .unwrap();

        assert!(Arc::ptr_eq(&fetcher.limiter(), &limiter));
        assert_eq!(fetcher.limiter().min_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_is_same_site() {
        assert!(is_same_site(Some("internshala.com"), "internshala.com"));
        assert!(is_same_site(Some("www.internshala.com"), "internshala.com"));
        assert!(is_same_site(Some("internshala.com"), "www.internshala.com"));
        assert!(is_same_site(Some("INTERNSHALA.com"), "internshala.com"));

        assert!(!is_same_site(Some("evil.com"), "internshala.com"));
        assert!(!is_same_site(Some("notinternshala.com"), "internshala.com"));
        assert!(!is_same_site(None, "internshala.com"));
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::OK), None);

        for status in [
            StatusCode::REQUEST_TIMEOUT,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            assert!(
                classify_status(status).unwrap().is_retryable(),
                "{} should be retryable",
                status
            );
        }

        for status in [StatusCode::FORBIDDEN, StatusCode::NOT_FOUND, StatusCode::GONE] {
            assert!(matches!(
                classify_status(status),
                Some(PageFetchResult::FatalFailure {
                    kind: FailureKind::Rejected,
                    ..
                })
            ));
        }
    }
}
