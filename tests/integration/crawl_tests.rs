//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the listing site and run the
//! full fetch, parse and deduplicate cycle end-to-end over HTTP.

use internship_scout::config::{Config, FetcherConfig, SearchInput, SiteConfig};
use internship_scout::crawler::{crawl, CrawlController};
use internship_scout::output::{JsonLinesSink, RecordSink};
use internship_scout::state::FailureKind;
use internship_scout::{ListingRecord, ScoutError, Termination};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIRST_PAGE: &str = "/internships/work-from-home-software-development-internships/";

fn page_path(page: usize) -> String {
    if page <= 1 {
        FIRST_PAGE.to_string()
    } else {
        format!("{}page-{}/", FIRST_PAGE, page)
    }
}

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str) -> Config {
    Config {
        site: SiteConfig {
            base_url: base_url.to_string(),
            ..SiteConfig::default()
        },
        fetcher: FetcherConfig {
            min_delay_ms: 5, // Very short for testing
            timeout_secs: 5,
            max_attempts: 3,
            backoff_base_ms: 5,
            backoff_max_ms: 20,
            ..FetcherConfig::default()
        },
        ..Config::default()
    }
}

fn search(max_results: u32, pages_to_scrape: u32) -> SearchInput {
    SearchInput {
        max_results,
        pages_to_scrape,
        ..SearchInput::default()
    }
}

/// Renders a results page with one card per id
fn listing_page(ids: &[&str]) -> String {
    let cards: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<div class="container-fluid individual_internship">
                    <h3><a class="job-title-href" href="/internship/detail/{id}">Intern {id}</a></h3>
                    <p class="company-name">Company {id}</p>
                    <div class="locations"><span><a>Work from home</a></span></div>
                    <div><i class="ic-16-calendar"></i><span>3 Months</span></div>
                    <span class="stipend">₹ 5,000 /month</span>
                </div>"#
            )
        })
        .collect();
    format!(
        r#"<html><head><title>Internships</title></head><body>
        <div id="internship_list_container">{}</div></body></html>"#,
        cards
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, page: usize, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path(page_path(page)))
        .respond_with(html(listing_page(ids)))
        .mount(server)
        .await;
}

fn links(records: &[ListingRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| {
            r.apply_link
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_multi_page_crawl_stops_on_empty_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, 1, &["a", "b"]).await;
    mount_page(&mock_server, 2, &["c", "d"]).await;
    mount_page(&mock_server, 3, &[]).await;

    let config = create_test_config(&base_url);
    let report = crawl(&config, &search(30, 10)).await.expect("crawl failed");

    assert_eq!(links(&report.records), vec!["a", "b", "c", "d"]);
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.termination, Termination::NoMoreResults);

    let first = &report.records[0];
    assert_eq!(first.title.as_deref(), Some("Intern a"));
    assert_eq!(first.company.as_deref(), Some("Company a"));
    assert_eq!(first.location.as_deref(), Some("Work from home"));
    assert_eq!(first.duration.as_deref(), Some("3 Months"));
    assert_eq!(first.stipend.as_deref(), Some("₹ 5,000 /month"));
    assert_eq!(first.logo_url, None);
    assert_eq!(
        first.apply_link,
        format!("{}/internship/detail/a", base_url)
    );
}

#[tokio::test]
async fn test_duplicates_across_pages_are_dropped() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, 1, &["a", "b", "c"]).await;
    mount_page(&mock_server, 2, &["a", "b", "c"]).await;
    mount_page(&mock_server, 3, &["c", "d"]).await;

    let config = create_test_config(&mock_server.uri());
    let report = crawl(&config, &search(30, 3)).await.expect("crawl failed");

    assert_eq!(links(&report.records), vec!["a", "b", "c", "d"]);
    assert_eq!(report.seen.len(), 4);
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.termination, Termination::PageLimitReached);
}

#[tokio::test]
async fn test_result_budget_truncates_output() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, 1, &["a", "b", "c"]).await;
    mount_page(&mock_server, 2, &["d", "e", "f"]).await;
    mount_page(&mock_server, 3, &["g", "h", "i"]).await;

    let config = create_test_config(&mock_server.uri());
    let report = crawl(&config, &search(5, 10)).await.expect("crawl failed");

    assert_eq!(links(&report.records), vec!["a", "b", "c", "d", "e"]);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.termination, Termination::BudgetExhausted);

    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let mock_server = MockServer::start().await;

    // First request fails, the retry succeeds
    Mock::given(method("GET"))
        .and(path(page_path(1)))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, 1, &["a"]).await;

    let config = create_test_config(&mock_server.uri());
    let report = crawl(&config, &search(30, 1)).await.expect("crawl failed");

    assert_eq!(links(&report.records), vec!["a"]);
    assert_eq!(report.fetch_attempts, 2);
    assert!(report.failed_pages.is_empty());
}

#[tokio::test]
async fn test_unreachable_first_page_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let result = crawl(&config, &search(30, 5)).await;

    assert!(matches!(result, Err(ScoutError::Unreachable { .. })));
}

#[tokio::test]
async fn test_missing_page_is_skipped() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, 1, &["a"]).await;
    Mock::given(method("GET"))
        .and(path(page_path(2)))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, 3, &["b"]).await;

    let config = create_test_config(&mock_server.uri());
    let report = crawl(&config, &search(30, 3)).await.expect("crawl failed");

    assert_eq!(links(&report.records), vec!["a", "b"]);
    assert_eq!(report.failed_pages.len(), 1);
    assert_eq!(report.failed_pages[0].index, 1);
    assert_eq!(report.failed_pages[0].kind, FailureKind::Rejected);
}

#[tokio::test]
async fn test_offsite_redirect_is_not_followed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(page_path(1)))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "https://example.com/login"),
        )
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, 2, &["a"]).await;

    let config = create_test_config(&mock_server.uri());
    let report = crawl(&config, &search(30, 2)).await.expect("crawl failed");

    assert_eq!(links(&report.records), vec!["a"]);
    assert_eq!(report.failed_pages.len(), 1);
    assert_eq!(report.failed_pages[0].kind, FailureKind::OffsiteRedirect);
}

#[tokio::test]
async fn test_same_site_redirect_is_followed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(page_path(1)))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/listing-moved/", mock_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/listing-moved/"))
        .respond_with(html(listing_page(&["moved"])))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let report = crawl(&config, &search(30, 1)).await.expect("crawl failed");

    assert_eq!(links(&report.records), vec!["moved"]);
}

#[tokio::test]
async fn test_invalid_filters_make_no_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html(listing_page(&["a"])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let input = SearchInput {
        work_from_home: false,
        location: "  ".to_string(),
        ..SearchInput::default()
    };

    let result = crawl(&config, &input).await;
    assert!(matches!(result, Err(ScoutError::InvalidFilter(_))));
}

#[tokio::test]
async fn test_records_stream_to_jsonl_sink() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, 1, &["a", "b"]).await;
    mount_page(&mock_server, 2, &[]).await;

    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let out_path = dir.path().join("listings.jsonl");

    let config = create_test_config(&mock_server.uri());
    let controller =
        CrawlController::from_config(&config, &search(30, 5)).expect("Failed to build controller");

    let mut sink = JsonLinesSink::create(&out_path).expect("Failed to create sink");
    let report = controller
        .run_with_sink(&mut sink)
        .await
        .expect("crawl failed");
    sink.finish().expect("Failed to finish sink");

    let content = std::fs::read_to_string(&out_path).expect("Failed to read output");
    let written: Vec<ListingRecord> = content
        .lines()
        .map(|line| serde_json::from_str(line).expect("Invalid JSON line"))
        .collect();
    assert_eq!(written, report.records);
    assert!(content.contains(r#""apply_link""#));
    assert!(!content.contains(r#""logo_url""#));
}
