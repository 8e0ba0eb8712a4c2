//! Cross-page deduplication of listing records

use crate::listing::ListingRecord;
use std::collections::HashSet;

/// Identities of every record already emitted in this run
///
/// Grows monotonically; nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    links: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, apply_link: &str) -> bool {
        self.links.contains(apply_link)
    }

    /// Records an identity, returning false if it was already present
    pub fn insert(&mut self, apply_link: impl Into<String>) -> bool {
        self.links.insert(apply_link.into())
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Keeps records whose identity has not been seen, in input order
///
/// Surviving identities are added to `seen`, so a duplicate within the same
/// batch is dropped as well.
pub fn filter_new(records: Vec<ListingRecord>, seen: &mut SeenSet) -> Vec<ListingRecord> {
    filter_new_capped(records, seen, usize::MAX)
}

/// Like [`filter_new`] but stops after `cap` new records
///
/// Records past the cap are neither returned nor added to `seen`.
pub fn filter_new_capped(
    records: Vec<ListingRecord>,
    seen: &mut SeenSet,
    cap: usize,
) -> Vec<ListingRecord> {
    records
        .into_iter()
        .filter(|record| seen.insert(record.identity()))
        .take(cap)
        .collect()
}
