//! Record sink trait and in-process sinks
//!
//! A sink receives each emitted record as the crawl accepts it and is
//! finished once the run ends.

use crate::listing::ListingRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for emitted listing records
pub trait RecordSink: Send {
    /// Takes one record, in emission order
    ///
    /// # Arguments
    ///
    /// * `record` - The record that was just accepted by the crawl
    fn accept(&mut self, record: &ListingRecord) -> OutputResult<()>;

    /// Flushes anything buffered; no records are accepted afterwards
    fn finish(&mut self) -> OutputResult<()>;
}

/// Discards every record
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RecordSink for NullSink {
    fn accept(&mut self, _record: &ListingRecord) -> OutputResult<()> {
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }
}

/// Keeps records in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Vec<ListingRecord>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl RecordSink for MemorySink {
    fn accept(&mut self, record: &ListingRecord) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Write("sink already finished".to_string()));
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.finished = true;
        Ok(())
    }
}
