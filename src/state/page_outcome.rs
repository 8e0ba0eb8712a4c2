//! Page-level outcomes of the crawl
//!
//! This module defines what a single page fetch can produce and why a run ends.
use std::fmt;

/// Why a page was given up on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Transient failures persisted past the retry cap
    Exhausted,

    /// The site answered with a non-retryable status (e.g. 403, 404)
    Rejected,

    /// The site redirected to a different host
    OffsiteRedirect,

    /// The page body could not be read as a listing page
    Malformed,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exhausted => "exhausted",
            Self::Rejected => "rejected",
            Self::OffsiteRedirect => "offsite_redirect",
            Self::Malformed => "malformed",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFetchResult {
    /// The page body. An empty listing page is still a success.
    Success(String),

    /// Timeout, connection error, 408/429/5xx; worth another attempt
    RetryableFailure(String),

    /// Not worth retrying; the page is skipped
    FatalFailure { kind: FailureKind, reason: String },
}

impl PageFetchResult {
    /// Shorthand for a fatal failure
    pub fn fatal(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self::FatalFailure {
            kind,
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RetryableFailure(_))
    }
}

/// Why a crawl run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// `max_results` records were collected
    BudgetExhausted,

    /// `pages_to_scrape` pages were visited
    PageLimitReached,

    /// The site returned a page with no listings
    NoMoreResults,

    /// The cancellation signal fired at a page boundary
    Cancelled,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BudgetExhausted => "budget_exhausted",
            Self::PageLimitReached => "page_limit_reached",
            Self::NoMoreResults => "no_more_results",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
