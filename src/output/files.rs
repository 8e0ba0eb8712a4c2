//! File sinks: JSON array, JSON Lines and CSV

use super::traits::{OutputError, OutputResult, RecordSink};
use crate::config::{OutputConfig, OutputFormat};
use crate::listing::ListingRecord;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Opens the sink selected by the output configuration
pub fn create_sink(config: &OutputConfig) -> OutputResult<Box<dyn RecordSink>> {
    let path = Path::new(&config.path);
    Ok(match config.format {
        OutputFormat::Json => Box::new(JsonSink::create(path)?),
        OutputFormat::Jsonl => Box::new(JsonLinesSink::create(path)?),
        OutputFormat::Csv => Box::new(CsvSink::create(path)?),
    })
}

fn create_file(path: &Path) -> OutputResult<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

/// Writes all records as one pretty-printed JSON array when finished
///
/// The file holds an empty array until [`RecordSink::finish`] is called, so a
/// run that stops early still leaves valid JSON behind.
#[derive(Debug)]
pub struct JsonSink {
    path: PathBuf,
    records: Vec<ListingRecord>,
    finished: bool,
}

impl JsonSink {
    pub fn create(path: &Path) -> OutputResult<Self> {
        let mut file = create_file(path)?;
        file.write_all(b"[]\n")?;
        Ok(Self {
            path: path.to_path_buf(),
            records: Vec::new(),
            finished: false,
        })
    }
}

impl RecordSink for JsonSink {
    fn accept(&mut self, record: &ListingRecord) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Write("sink already finished".to_string()));
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        let mut writer = BufWriter::new(create_file(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, &self.records)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        self.finished = true;
        tracing::debug!("Wrote {} records to {}", self.records.len(), self.path.display());
        Ok(())
    }
}

/// Appends one JSON object per line as records arrive
#[derive(Debug)]
pub struct JsonLinesSink {
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    pub fn create(path: &Path) -> OutputResult<Self> {
        Ok(Self {
            writer: BufWriter::new(create_file(path)?),
        })
    }
}

impl RecordSink for JsonLinesSink {
    fn accept(&mut self, record: &ListingRecord) -> OutputResult<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Column names, in [`CsvRow`] field order
const CSV_COLUMNS: [&str; 11] = [
    "title",
    "company",
    "location",
    "duration",
    "stipend",
    "actively_hiring",
    "early_applicant",
    "type",
    "posted",
    "apply_link",
    "logo_url",
];

/// One CSV row; every column is always present
#[derive(Serialize)]
struct CsvRow<'a> {
    title: Option<&'a str>,
    company: Option<&'a str>,
    location: Option<&'a str>,
    duration: Option<&'a str>,
    stipend: Option<&'a str>,
    actively_hiring: bool,
    early_applicant: bool,
    #[serde(rename = "type")]
    kind: Option<&'a str>,
    posted: Option<&'a str>,
    apply_link: &'a str,
    logo_url: Option<&'a str>,
}

impl<'a> From<&'a ListingRecord> for CsvRow<'a> {
    fn from(record: &'a ListingRecord) -> Self {
        Self {
            title: record.title.as_deref(),
            company: record.company.as_deref(),
            location: record.location.as_deref(),
            duration: record.duration.as_deref(),
            stipend: record.stipend.as_deref(),
            actively_hiring: record.actively_hiring,
            early_applicant: record.early_applicant,
            kind: record.kind.as_deref(),
            posted: record.posted.as_deref(),
            apply_link: &record.apply_link,
            logo_url: record.logo_url.as_deref(),
        }
    }
}

/// Writes a header and one row per record, flushed as records arrive
///
/// The header goes out on creation, so an empty run still yields a valid
/// file. Absent fields become empty cells.
pub struct CsvSink {
    writer: csv::Writer<File>,
}

impl CsvSink {
    pub fn create(path: &Path) -> OutputResult<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(create_file(path)?);
        writer.write_record(CSV_COLUMNS)?;
        writer.flush()?;
        Ok(Self { writer })
    }
}

impl RecordSink for CsvSink {
    fn accept(&mut self, record: &ListingRecord) -> OutputResult<()> {
        self.writer.serialize(CsvRow::from(record))?;
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
