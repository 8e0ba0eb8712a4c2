//! Output module for emitted records and run summaries
//!
//! This module handles:
//! - The `RecordSink` interface the crawl forwards records to
//! - JSON, JSON Lines and CSV file sinks
//! - Listing statistics for the end-of-run summary

mod files;
pub mod stats;
mod traits;

pub use files::{create_sink, CsvSink, JsonLinesSink, JsonSink};
pub use stats::{print_statistics, ListingStatistics};
pub use traits::{MemorySink, NullSink, OutputError, OutputResult, RecordSink};
