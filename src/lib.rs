//! Internship-Scout: a polite internship listing harvester
//!
//! This crate builds paginated search URLs from a small set of filters, fetches
//! each results page with rate limiting and retries, extracts listing records
//! from change-prone markup, and deduplicates them across pages until a result
//! or page budget is met.

pub mod config;
pub mod crawler;
pub mod listing;
pub mod output;
pub mod query;
pub mod state;

use thiserror::Error;

/// Main error type for Internship-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid search filter: {0}")]
    InvalidFilter(#[from] FilterError),

    #[error("Target site unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse search input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while turning search filters into a URL
///
/// These are input-level problems and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("job category cannot be empty")]
    EmptyCategory,

    #[error("location cannot be empty unless work-from-home is set")]
    EmptyLocation,

    #[error("minimum stipend '{0}' contains no amount")]
    InvalidStipend(String),
}

/// Result type alias for Internship-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, SearchInput};
pub use crawler::{CrawlController, CrawlReport};
pub use listing::ListingRecord;
pub use query::{QueryBuilder, SearchFilters};
pub use state::{CrawlBudget, PageFetchResult, Termination};
