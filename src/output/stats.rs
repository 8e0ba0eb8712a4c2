//! Statistics over a set of listing records
//!
//! This module summarizes what a crawl collected and prints the summary at
//! the end of a CLI run.

use crate::crawler::CrawlReport;
use crate::listing::ListingRecord;
use std::collections::{HashMap, HashSet};

/// Listing statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingStatistics {
    /// Total number of records
    pub total: usize,

    /// Number of distinct titles
    pub unique_titles: usize,

    /// Number of distinct companies
    pub unique_companies: usize,

    /// Most common locations with their counts, most frequent first
    pub top_locations: Vec<(String, usize)>,

    /// Records carrying the "actively hiring" badge
    pub actively_hiring: usize,
}

impl ListingStatistics {
    /// Computes statistics over `records`
    pub fn from_records(records: &[ListingRecord]) -> Self {
        let unique_titles = records
            .iter()
            .filter_map(|r| r.title.as_deref())
            .collect::<HashSet<_>>()
            .len();
        let unique_companies = records
            .iter()
            .filter_map(|r| r.company.as_deref())
            .collect::<HashSet<_>>()
            .len();

        let mut location_counts: HashMap<&str, usize> = HashMap::new();
        for location in records.iter().filter_map(|r| r.location.as_deref()) {
            *location_counts.entry(location).or_default() += 1;
        }
        let mut top_locations: Vec<_> = location_counts
            .into_iter()
            .map(|(location, count)| (location.to_string(), count))
            .collect();
        // Ties broken by name so the ranking is stable
        top_locations.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_locations.truncate(3);

        Self {
            total: records.len(),
            unique_titles,
            unique_companies,
            top_locations,
            actively_hiring: records.iter().filter(|r| r.actively_hiring).count(),
        }
    }

    /// Share of records marked actively hiring, as a percentage
    pub fn actively_hiring_percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.actively_hiring as f64 / self.total as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `report` - The run the records came from
pub fn print_statistics(stats: &ListingStatistics, report: &CrawlReport) {
    println!("=== Crawl Statistics ===\n");

    println!("Run:");
    println!("  Stopped because: {}", report.termination);
    println!("  Pages fetched: {}", report.pages_fetched);
    println!("  Fetch attempts: {}", report.fetch_attempts);
    println!(
        "  Duration: {:.1}s",
        (report.finished_at - report.started_at).num_milliseconds() as f64 / 1000.0
    );
    println!();

    if !report.failed_pages.is_empty() {
        println!("Skipped Pages ({}):", report.failed_pages.len());
        for page in &report.failed_pages {
            println!("  - page {} [{}]: {}", page.index, page.kind, page.reason);
        }
        println!();
    }

    println!("Listings:");
    println!("  Total: {}", stats.total);
    println!("  Unique titles: {}", stats.unique_titles);
    println!("  Unique companies: {}", stats.unique_companies);
    println!(
        "  Actively hiring: {} ({:.1}%)",
        stats.actively_hiring,
        stats.actively_hiring_percentage()
    );

    if !stats.top_locations.is_empty() {
        println!();
        println!("Top Locations:");
        for (location, count) in &stats.top_locations {
            println!("  {}: {}", location, count);
        }
    }
}
