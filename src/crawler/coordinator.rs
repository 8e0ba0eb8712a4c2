//! Crawl controller - main crawl orchestration logic
//!
//! This module drives one crawl run page by page:
//! - Building each page URL from the search filters
//! - Fetching it through the retrying, rate-limited fetcher
//! - Parsing and deduplicating the listings
//! - Enforcing the result and page budget
//! - Honoring cancellation at page boundaries

use crate::config::{validate, validate_input, Config, SearchInput};
use crate::crawler::dedup::{filter_new_capped, SeenSet};
use crate::crawler::fallback::build_page_fetcher;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::ListingParser;
use crate::crawler::retry::{fetch_with_retry, RetryPolicy};
use crate::crawler::throttle::{Clock, TokioClock};
use crate::listing::ListingRecord;
use crate::output::{NullSink, RecordSink};
use crate::query::{QueryBuilder, SearchFilters};
use crate::state::{CrawlBudget, FailureKind, PageFetchResult, Termination};
use crate::ScoutError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A page that was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPage {
    pub index: usize,
    pub url: String,
    pub kind: FailureKind,
    pub reason: String,
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Emitted records, in emission order
    pub records: Vec<ListingRecord>,

    /// Identities of every emitted record
    pub seen: SeenSet,

    /// Number of pages a fetch was started for
    pub pages_fetched: usize,

    /// Total fetch attempts across all pages, retries included
    pub fetch_attempts: u32,

    pub failed_pages: Vec<FailedPage>,

    pub termination: Termination,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Runs the page-by-page crawl loop for one search
pub struct CrawlController {
    query: QueryBuilder,
    filters: SearchFilters,
    budget: CrawlBudget,
    fetcher: Arc<dyn PageFetcher>,
    parser: ListingParser,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl CrawlController {
    /// Creates a controller with the default retry policy and a real clock
    pub fn new(
        query: QueryBuilder,
        filters: SearchFilters,
        budget: CrawlBudget,
        fetcher: Arc<dyn PageFetcher>,
        parser: ListingParser,
    ) -> Self {
        Self {
            query,
            filters,
            budget,
            fetcher,
            parser,
            retry: RetryPolicy::default(),
            clock: Arc::new(TokioClock),
            cancel: CancellationToken::new(),
        }
    }

    /// Wires a controller from the crawler configuration and search input
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `input` - The search filters and budget for this run
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlController)` - Ready to run
    /// * `Err(ScoutError)` - Invalid configuration or input, or the HTTP client failed to build
    pub fn from_config(config: &Config, input: &SearchInput) -> Result<Self, ScoutError> {
        validate(config)?;
        validate_input(input)?;

        let query = QueryBuilder::new(&config.site.base_url, config.site.pagination.clone())?;
        let filters = input.filters();
        query.validate(&filters)?;

        let clock: Arc<dyn Clock> = Arc::new(TokioClock);
        let fetcher = build_page_fetcher(&config.fetcher, query.base_url(), clock.clone())?;
        let parser = ListingParser::new(query.base_url().clone());

        Ok(Self::new(query, filters, input.budget(), fetcher, parser)
            .with_retry_policy(RetryPolicy::from_config(&config.fetcher))
            .with_clock(clock))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the clock used for retry backoff
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Uses `cancel` to stop the run at the next page boundary
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// A handle that cancels this controller's run
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Every page URL the budget allows, without fetching anything
    pub fn planned_urls(&self) -> Result<Vec<Url>, ScoutError> {
        (0..self.budget.max_pages)
            .map(|index| Ok(self.query.build_page_url(&self.filters, index)?))
            .collect()
    }

    /// Runs the crawl and returns the collected records
    pub async fn run(&self) -> Result<CrawlReport, ScoutError> {
        self.run_with_sink(&mut NullSink).await
    }

    /// Runs the crawl, handing each emitted record to `sink` as it is accepted
    ///
    /// The sink is not finished; that is left to the caller.
    pub async fn run_with_sink(
        &self,
        sink: &mut dyn RecordSink,
    ) -> Result<CrawlReport, ScoutError> {
        // Filter problems surface before anything goes over the network
        self.query.build_page_url(&self.filters, 0)?;

        let started_at = Utc::now();
        let mut counter = self.budget.start();
        let mut seen = SeenSet::new();
        let mut records = Vec::new();
        let mut failed_pages = Vec::new();
        let mut pages_fetched = 0;
        let mut fetch_attempts = 0;
        let mut page_index = 0;

        tracing::info!(
            "Starting crawl: up to {} results over {} pages",
            self.budget.max_results,
            self.budget.max_pages
        );

        let termination = loop {
            if self.cancel.is_cancelled() {
                tracing::info!("Crawl cancelled before page {}", page_index);
                break Termination::Cancelled;
            }

            let url = self.query.build_page_url(&self.filters, page_index)?;
            tracing::debug!(
                "Fetching page {} ({} left in budget): {}",
                page_index,
                counter.remaining_pages(),
                url
            );

            let outcome =
                fetch_with_retry(self.fetcher.as_ref(), &url, &self.retry, self.clock.as_ref())
                    .await;
            pages_fetched += 1;
            fetch_attempts += outcome.attempts;

            let failure = match outcome.result {
                PageFetchResult::Success(html) => match self.parser.parse(&html) {
                    Ok(page) => {
                        if page.records.is_empty() {
                            tracing::info!("Page {} has no listings, stopping", page_index);
                            break Termination::NoMoreResults;
                        }

                        let found = page.records.len();
                        let fresh =
                            filter_new_capped(page.records, &mut seen, counter.remaining_results());
                        counter.consume_results(fresh.len());

                        tracing::info!(
                            "Page {}: {} listings, {} new, {} total",
                            page_index,
                            found,
                            fresh.len(),
                            records.len() + fresh.len()
                        );

                        for record in &fresh {
                            sink.accept(record)?;
                        }
                        records.extend(fresh);
                        None
                    }
                    Err(e) => Some((FailureKind::Malformed, e.to_string())),
                },
                PageFetchResult::FatalFailure { kind, reason } => {
                    if page_index == 0 && kind == FailureKind::Exhausted {
                        return Err(ScoutError::Unreachable {
                            url: url.to_string(),
                            reason,
                        });
                    }
                    Some((kind, reason))
                }
                PageFetchResult::RetryableFailure(reason) => Some((FailureKind::Exhausted, reason)),
            };

            if let Some((kind, reason)) = failure {
                tracing::warn!("Skipping page {} ({}): {}", page_index, kind, reason);
                failed_pages.push(FailedPage {
                    index: page_index,
                    url: url.to_string(),
                    kind,
                    reason,
                });
            }

            page_index += 1;
            counter.consume_page();

            if counter.results_exhausted() {
                break Termination::BudgetExhausted;
            }
            if counter.pages_exhausted() {
                break Termination::PageLimitReached;
            }
        };

        tracing::info!(
            "Crawl finished ({}): {} records from {} pages, {} skipped",
            termination,
            records.len(),
            pages_fetched,
            failed_pages.len()
        );

        Ok(CrawlReport {
            records,
            seen,
            pages_fetched,
            fetch_attempts,
            failed_pages,
            termination,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::throttle::ManualClock;
    use crate::output::MemorySink;
    use crate::query::Pagination;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    const BASE: &str = "https://internshala.com/";

    /// Serves scripted results per page URL; unscripted pages are empty
    #[derive(Default)]
    struct ScriptedSite {
        pages: Mutex<HashMap<String, VecDeque<PageFetchResult>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSite {
        fn script(&self, url: &Url, results: Vec<PageFetchResult>) {
            self.pages
                .lock()
                .unwrap()
                .insert(url.to_string(), results.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedSite {
        async fn fetch(&self, url: &Url) -> PageFetchResult {
            self.calls.lock().unwrap().push(url.to_string());
            self.pages
                .lock()
                .unwrap()
                .get_mut(url.as_str())
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| PageFetchResult::Success(listing_page(&[])))
        }
    }

    fn listing_page(ids: &[&str]) -> String {
        let cards: String = ids
            .iter()
            .map(|id| {
                format!(
                    r#"<div class="individual_internship">
                        <a class="job-title-href" href="/internship/detail/{id}">Role {id}</a>
                        <p class="company-name">Company {id}</p>
                    </div>"#
                )
            })
            .collect();
        format!("<html><body><div id=\"internship_list_container\">{}</div></body></html>", cards)
    }

    fn filters() -> SearchFilters {
        SearchInput::default().filters()
    }

    fn query() -> QueryBuilder {
        QueryBuilder::new(BASE, Pagination::default()).unwrap()
    }

    fn page_url(index: usize) -> Url {
        query().build_page_url(&filters(), index).unwrap()
    }

    fn controller(site: Arc<ScriptedSite>, max_results: usize, max_pages: usize) -> CrawlController {
        CrawlController::new(
            query(),
            filters(),
            CrawlBudget::new(max_results, max_pages),
            site,
            ListingParser::new(Url::parse(BASE).unwrap()),
        )
        .with_retry_policy(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
        })
        .with_clock(Arc::new(ManualClock::new()))
    }

    fn ok(ids: &[&str]) -> PageFetchResult {
        PageFetchResult::Success(listing_page(ids))
    }

    #[tokio::test]
    async fn test_budget_truncates_last_page() {
        let site = Arc::new(ScriptedSite::default());
        for index in 0..10 {
            let ids: Vec<String> = (0..3).map(|n| format!("p{}-{}", index, n)).collect();
            let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
            site.script(&page_url(index), vec![ok(&ids)]);
        }

        let report = controller(site.clone(), 5, 10).run().await.unwrap();

        assert_eq!(report.records.len(), 5);
        assert_eq!(report.pages_fetched, 2);
        assert_eq!(site.calls().len(), 2);
        assert_eq!(report.termination, Termination::BudgetExhausted);
        assert_eq!(report.seen.len(), 5);
        assert!(!report.seen.contains("https://internshala.com/internship/detail/p1-2"));
    }

    #[tokio::test]
    async fn test_repeated_page_is_deduplicated_and_crawl_continues() {
        let site = Arc::new(ScriptedSite::default());
        site.script(&page_url(0), vec![ok(&["a", "b", "c"])]);
        site.script(&page_url(1), vec![ok(&["a", "b", "c"])]);
        site.script(&page_url(2), vec![ok(&["d"])]);

        let report = controller(site.clone(), 30, 3).run().await.unwrap();

        let links: Vec<_> = report.records.iter().map(|r| r.apply_link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://internshala.com/internship/detail/a",
                "https://internshala.com/internship/detail/b",
                "https://internshala.com/internship/detail/c",
                "https://internshala.com/internship/detail/d",
            ]
        );
        assert_eq!(report.pages_fetched, 3);
        assert_eq!(report.termination, Termination::PageLimitReached);
    }

    #[tokio::test]
    async fn test_retryable_failures_then_success() {
        let site = Arc::new(ScriptedSite::default());
        site.script(
            &page_url(0),
            vec![
                PageFetchResult::RetryableFailure("HTTP 503".into()),
                PageFetchResult::RetryableFailure("timeout".into()),
                ok(&["a"]),
            ],
        );

        let report = controller(site.clone(), 30, 1).run().await.unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.fetch_attempts, 3);
        assert!(report.failed_pages.is_empty());
    }

    #[tokio::test]
    async fn test_empty_page_ends_the_run() {
        let site = Arc::new(ScriptedSite::default());
        site.script(&page_url(0), vec![ok(&["a", "b"])]);
        site.script(&page_url(1), vec![ok(&[])]);

        let report = controller(site.clone(), 30, 10).run().await.unwrap();

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.pages_fetched, 2);
        assert_eq!(report.termination, Termination::NoMoreResults);
    }

    #[tokio::test]
    async fn test_empty_first_page_is_not_an_error() {
        let site = Arc::new(ScriptedSite::default());

        let report = controller(site, 30, 10).run().await.unwrap();

        assert!(report.records.is_empty());
        assert_eq!(report.termination, Termination::NoMoreResults);
    }

    #[tokio::test]
    async fn test_fatal_page_is_skipped() {
        let site = Arc::new(ScriptedSite::default());
        site.script(&page_url(0), vec![ok(&["a"])]);
        site.script(
            &page_url(1),
            vec![PageFetchResult::fatal(FailureKind::Rejected, "HTTP 403")],
        );
        site.script(&page_url(2), vec![PageFetchResult::Success("no markup here".into())]);
        site.script(&page_url(3), vec![ok(&["b"])]);

        let report = controller(site, 30, 4).run().await.unwrap();

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.failed_pages.len(), 2);
        assert_eq!(report.failed_pages[0].index, 1);
        assert_eq!(report.failed_pages[0].kind, FailureKind::Rejected);
        assert_eq!(report.failed_pages[1].kind, FailureKind::Malformed);
        assert_eq!(report.termination, Termination::PageLimitReached);
    }

    #[tokio::test]
    async fn test_unreachable_first_page_aborts() {
        let site = Arc::new(ScriptedSite::default());
        site.script(
            &page_url(0),
            vec![PageFetchResult::RetryableFailure("connection refused".into()); 3],
        );

        let err = controller(site.clone(), 30, 10).run().await.unwrap_err();

        assert!(matches!(err, ScoutError::Unreachable { .. }));
        assert_eq!(site.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_later_page_is_skipped() {
        let site = Arc::new(ScriptedSite::default());
        site.script(&page_url(0), vec![ok(&["a"])]);
        site.script(
            &page_url(1),
            vec![PageFetchResult::RetryableFailure("HTTP 502".into()); 3],
        );
        site.script(&page_url(2), vec![ok(&["b"])]);

        let report = controller(site, 30, 3).run().await.unwrap();

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.failed_pages[0].kind, FailureKind::Exhausted);
        assert_eq!(report.fetch_attempts, 5);
    }

    #[tokio::test]
    async fn test_invalid_filters_fail_before_fetching() {
        let site = Arc::new(ScriptedSite::default());
        let mut filters = filters();
        filters.job_category = "   ".into();

        let controller = CrawlController::new(
            query(),
            filters,
            CrawlBudget::new(5, 5),
            site.clone(),
            ListingParser::new(Url::parse(BASE).unwrap()),
        );
        let err = controller.run().await.unwrap_err();

        assert!(matches!(err, ScoutError::InvalidFilter(_)));
        assert!(site.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_run_keeps_partial_output() {
        let site = Arc::new(ScriptedSite::default());
        site.script(&page_url(0), vec![ok(&["a"])]);

        let token = CancellationToken::new();
        token.cancel();
        let report = controller(site.clone(), 30, 10)
            .with_cancellation(token)
            .run()
            .await
            .unwrap();

        assert_eq!(report.termination, Termination::Cancelled);
        assert!(report.records.is_empty());
        assert!(site.calls().is_empty());
    }

    #[tokio::test]
    async fn test_records_are_forwarded_to_sink() {
        let site = Arc::new(ScriptedSite::default());
        site.script(&page_url(0), vec![ok(&["a", "b"])]);

        let mut sink = MemorySink::new();
        let report = controller(site, 30, 1)
            .run_with_sink(&mut sink)
            .await
            .unwrap();

        assert_eq!(sink.records(), report.records.as_slice());
    }

    #[test]
    fn test_planned_urls_follow_budget() {
        let site = Arc::new(ScriptedSite::default());
        let urls = controller(site, 30, 3).planned_urls().unwrap();

        assert_eq!(urls.len(), 3);
        assert_eq!(urls[0], page_url(0));
        assert!(urls[2].as_str().ends_with("page-3/"));
    }
}
