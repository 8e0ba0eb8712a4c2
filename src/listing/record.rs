use serde::{Deserialize, Serialize};

/// One internship posting
///
/// Only `apply_link` is required; it is also the record's identity. Fields the
/// source page did not show stay `None` and are left out of serialized output.
/// Stipend, duration and posted values keep the site's display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stipend: Option<String>,

    #[serde(default)]
    pub actively_hiring: bool,

    #[serde(default)]
    pub early_applicant: bool,

    /// Listing type label, e.g. "Internship with job offer"
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// "Posted X ago" text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted: Option<String>,

    /// Absolute URL of the listing detail page
    pub apply_link: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

impl ListingRecord {
    /// Creates a record with only its identity set
    pub fn new(apply_link: impl Into<String>) -> Self {
        Self {
            title: None,
            company: None,
            location: None,
            duration: None,
            stipend: None,
            actively_hiring: false,
            early_applicant: false,
            kind: None,
            posted: None,
            apply_link: apply_link.into(),
            logo_url: None,
        }
    }

    /// The deduplication key
    pub fn identity(&self) -> &str {
        &self.apply_link
    }
}
