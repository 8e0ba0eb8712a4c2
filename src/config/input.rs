use crate::query::SearchFilters;
use crate::state::CrawlBudget;
use serde::Deserialize;

/// Search input document
///
/// Field names follow the published input schema, so the same JSON that
/// drives a hosted run can be fed to the CLI unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchInput {
    pub max_results: u32,
    pub job_category: String,
    pub work_from_home: bool,
    pub location: String,
    pub part_time: bool,
    pub stipend: String,
    pub pages_to_scrape: u32,
}

impl Default for SearchInput {
    fn default() -> Self {
        Self {
            max_results: 30,
            job_category: "Software Development".to_string(),
            work_from_home: true,
            location: "Delhi".to_string(),
            part_time: false,
            stipend: String::new(),
            pages_to_scrape: 20,
        }
    }
}

impl SearchInput {
    /// The filter half of the input
    pub fn filters(&self) -> SearchFilters {
        SearchFilters {
            job_category: self.job_category.clone(),
            work_from_home: self.work_from_home,
            location: self.location.clone(),
            part_time: self.part_time,
            min_stipend: self.stipend.clone(),
        }
    }

    /// The budget half of the input
    pub fn budget(&self) -> CrawlBudget {
        CrawlBudget::new(self.max_results as usize, self.pages_to_scrape as usize)
    }
}
