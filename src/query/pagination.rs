use serde::Deserialize;

/// Maps a 0-based page index onto the site's pagination convention
///
/// The first page (index 0) is always the bare search URL; only later pages
/// carry a page marker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Pagination {
    /// Trailing `page-{n}/` path segment, numbered from `first_page`
    PathSegment {
        #[serde(rename = "first-page", default = "default_first_page")]
        first_page: u32,
    },

    /// `?{param}={index * page_size}` result offset
    QueryOffset {
        param: String,
        #[serde(rename = "page-size")]
        page_size: u32,
    },
}

fn default_first_page() -> u32 {
    1
}

impl Default for Pagination {
    fn default() -> Self {
        Self::PathSegment {
            first_page: default_first_page(),
        }
    }
}

/// Where the page marker lands in the URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageMarker {
    /// Path segment to append (without slashes)
    Segment(String),
    /// Query parameter name and value
    Query(String, String),
}

impl Pagination {
    /// Returns the page marker for `page_index`, or `None` for the first page
    pub fn marker(&self, page_index: usize) -> Option<PageMarker> {
        if page_index == 0 {
            return None;
        }

        match self {
            Self::PathSegment { first_page } => Some(PageMarker::Segment(format!(
                "page-{}",
                page_index as u64 + u64::from(*first_page)
            ))),
            Self::QueryOffset { param, page_size } => Some(PageMarker::Query(
                param.clone(),
                (page_index as u64 * u64::from(*page_size)).to_string(),
            )),
        }
    }
}
