//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlBudget` / `BudgetCounter`: result and page limits and their countdown
//! - `PageFetchResult` / `FailureKind`: what a page fetch produced
//! - `Termination`: why a run ended

mod budget;
mod page_outcome;

// Re-export main types
pub use budget::{BudgetCounter, CrawlBudget};
pub use page_outcome::{FailureKind, PageFetchResult, Termination};
