//! Query building for the listing search
//!
//! This module turns search filters into the site's canonical search URL:
//! - category and location slugs
//! - the work-from-home / location branch
//! - part-time and minimum-stipend filters
//! - per-page offsets through a configurable [`Pagination`] mapping

mod pagination;
mod slug;

pub use pagination::{PageMarker, Pagination};
pub use slug::{slugify, stipend_amount};

use crate::FilterError;
use url::Url;

/// Search filters for one crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilters {
    /// Listing category, e.g. "Software Development"
    pub job_category: String,

    /// Remote listings only; when set, `location` is ignored
    pub work_from_home: bool,

    /// City to search in when not remote
    pub location: String,

    /// Part-time listings only
    pub part_time: bool,

    /// Free-form minimum stipend; empty means unconstrained
    pub min_stipend: String,
}

/// Builds per-page search URLs for one site
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base: Url,
    pagination: Pagination,
}

impl QueryBuilder {
    /// Creates a query builder rooted at `base_url`
    ///
    /// A base URL with a path prefix is treated as a directory, so search paths
    /// are appended beneath it.
    pub fn new(base_url: &str, pagination: Pagination) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.set_query(None);
        base.set_fragment(None);

        Ok(Self { base, pagination })
    }

    /// The site root this builder produces URLs under
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Checks filters without building a URL
    pub fn validate(&self, filters: &SearchFilters) -> Result<(), FilterError> {
        self.listing_segment(filters)?;
        stipend_amount(&filters.min_stipend)?;
        Ok(())
    }

    /// Builds the search URL for the 0-based `page_index`
    ///
    /// # Errors
    ///
    /// Returns a [`FilterError`] for an empty category, an empty location on a
    /// non-remote search, or a stipend filter that carries no amount.
    ///
    /// # Example
    ///
    /// ```
    /// use internship_scout::query::{Pagination, QueryBuilder, SearchFilters};
    ///
    /// let builder = QueryBuilder::new("https://internshala.com/", Pagination::default()).unwrap();
    /// let filters = SearchFilters {
    ///     job_category: "Software Development".to_string(),
    ///     work_from_home: true,
    ///     location: String::new(),
    ///     part_time: false,
    ///     min_stipend: String::new(),
    /// };
    /// let url = builder.build_page_url(&filters, 1).unwrap();
    /// assert_eq!(
    ///     url.as_str(),
    ///     "https://internshala.com/internships/work-from-home-software-development-internships/page-2/"
    /// );
    /// ```
    pub fn build_page_url(
        &self,
        filters: &SearchFilters,
        page_index: usize,
    ) -> Result<Url, FilterError> {
        let mut path = format!(
            "{}internships/{}/",
            self.base.path(),
            self.listing_segment(filters)?
        );

        if let Some(amount) = stipend_amount(&filters.min_stipend)? {
            path.push_str(&format!("stipend-{}/", amount));
        }

        let mut url = self.base.clone();
        match self.pagination.marker(page_index) {
            Some(PageMarker::Segment(segment)) => {
                path.push_str(&segment);
                path.push('/');
                url.set_path(&path);
            }
            Some(PageMarker::Query(param, value)) => {
                url.set_path(&path);
                url.query_pairs_mut().append_pair(&param, &value);
            }
            None => url.set_path(&path),
        }

        Ok(url)
    }

    /// Builds the listing segment, e.g. `work-from-home-part-time-accounts-internships`
    fn listing_segment(&self, filters: &SearchFilters) -> Result<String, FilterError> {
        let category = slugify(&filters.job_category);
        if category.is_empty() {
            return Err(FilterError::EmptyCategory);
        }

        let mut segment = String::new();
        if filters.work_from_home {
            segment.push_str("work-from-home-");
        }
        if filters.part_time {
            segment.push_str("part-time-");
        }
        segment.push_str(&category);

        if filters.work_from_home {
            segment.push_str("-internships");
        } else {
            let location = slugify(&filters.location);
            if location.is_empty() {
                return Err(FilterError::EmptyLocation);
            }
            segment.push_str("-internship-in-");
            segment.push_str(&location);
        }

        Ok(segment)
    }
}
