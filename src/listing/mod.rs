//! Listing records extracted from search result pages

mod record;

pub use record::ListingRecord;
