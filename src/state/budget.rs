/// Result and page limits for one crawl run
///
/// The run halts as soon as either counter reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlBudget {
    pub max_results: usize,
    pub max_pages: usize,
}

impl CrawlBudget {
    /// Creates a budget; zero limits are raised to one
    pub fn new(max_results: usize, max_pages: usize) -> Self {
        Self {
            max_results: max_results.max(1),
            max_pages: max_pages.max(1),
        }
    }

    /// Starts a countdown for a new run
    pub fn start(&self) -> BudgetCounter {
        BudgetCounter {
            remaining_results: self.max_results,
            remaining_pages: self.max_pages,
        }
    }
}

/// Remaining budget while a run is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetCounter {
    remaining_results: usize,
    remaining_pages: usize,
}

impl BudgetCounter {
    pub fn remaining_results(&self) -> usize {
        self.remaining_results
    }

    pub fn remaining_pages(&self) -> usize {
        self.remaining_pages
    }

    /// Records accepted records, saturating at zero
    pub fn consume_results(&mut self, count: usize) {
        self.remaining_results = self.remaining_results.saturating_sub(count);
    }

    /// Records that one page slot was used, whether it succeeded or not
    pub fn consume_page(&mut self) {
        self.remaining_pages = self.remaining_pages.saturating_sub(1);
    }

    pub fn results_exhausted(&self) -> bool {
        self.remaining_results == 0
    }

    pub fn pages_exhausted(&self) -> bool {
        self.remaining_pages == 0
    }
}
