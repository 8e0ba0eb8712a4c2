//! Crawler module for listing page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with rate limiting and retry logic
//! - An optional headless browser fallback for refused pages
//! - Listing extraction from search result pages
//! - Cross-page deduplication
//! - Overall crawl coordination

#[cfg(feature = "browser")]
mod browser;
mod coordinator;
mod dedup;
mod fallback;
mod fetcher;
mod parser;
mod retry;
mod throttle;

pub use coordinator::{CrawlController, CrawlReport, FailedPage};
#[cfg(feature = "browser")]
pub use browser::{BrowserError, BrowserFetcher};
pub use dedup::{filter_new, filter_new_capped, SeenSet};
pub use fallback::{build_page_fetcher, FallbackFetcher};
pub use fetcher::{build_http_client, classify_status, is_same_site, HttpFetcher, PageFetcher};
pub use parser::{ListingParser, ParseError, ParsedPage};
pub use retry::{fetch_with_retry, FetchOutcome, RetryPolicy};
#[cfg(any(test, feature = "test-util"))]
pub use throttle::ManualClock;
pub use throttle::{Clock, RateLimiter, TokioClock};

use crate::config::{Config, SearchInput};
use crate::ScoutError;

/// Runs a complete crawl for one search
///
/// This is the main library entry point. It will:
/// 1. Validate the configuration and search input
/// 2. Build the HTTP client and listing parser
/// 3. Fetch, parse and deduplicate pages until the budget is spent
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `input` - The search filters and budget
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The run finished, possibly with zero records
/// * `Err(ScoutError)` - Invalid input, or the site was unreachable on the first page
pub async fn crawl(config: &Config, input: &SearchInput) -> Result<CrawlReport, ScoutError> {
    CrawlController::from_config(config, input)?.run().await
}
