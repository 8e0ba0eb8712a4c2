use crate::query::Pagination;
use serde::Deserialize;

/// Default site the scout searches
pub const DEFAULT_BASE_URL: &str = "https://internshala.com/";

/// Default browser-like user agent; the site rejects obvious bot identifiers
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Main configuration structure for Internship-Scout
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub fetcher: FetcherConfig,
    pub output: OutputConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Root of the listing site (search paths are joined onto it)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// How a 0-based page index maps onto the site's pagination
    pub pagination: Pagination,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            pagination: Pagination::default(),
        }
    }
}

/// HTTP fetcher behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Minimum time between two consecutive requests (milliseconds)
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Maximum attempts per page, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Backoff before the second attempt (milliseconds); doubles per retry
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Upper bound for a single backoff (milliseconds)
    #[serde(rename = "backoff-max-ms")]
    pub backoff_max_ms: u64,

    /// Retry pages the HTTP client was refused on with a headless browser
    ///
    /// Only takes effect when built with the `browser` feature.
    #[serde(rename = "browser-fallback")]
    pub browser_fallback: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            min_delay_ms: 2000,
            timeout_secs: 30,
            max_attempts: 3,
            backoff_base_ms: 1000,
            backoff_max_ms: 30_000,
            browser_fallback: false,
        }
    }
}

/// Serialization format of the output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A single JSON array written when the run finishes
    #[default]
    Json,
    /// One JSON object per line, written as records arrive
    Jsonl,
    /// CSV with a header row, written as records arrive
    Csv,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the output file
    pub path: String,

    /// Output file format
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "internships.json".to_string(),
            format: OutputFormat::Json,
        }
    }
}
