//! Configuration module for Internship-Scout
//!
//! This module handles two inputs:
//! - the TOML crawler configuration (site, fetcher, output sections)
//! - the JSON search input (filters and budget)
//!
//! # Example
//!
//! ```no_run
//! use internship_scout::config::{load_config, parse_input};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! let input = parse_input(r#"{"job_category": "Marketing"}"#).unwrap();
//! println!("{} pages at most from {}", input.pages_to_scrape, config.site.base_url);
//! ```

mod input;
mod parser;
mod types;
mod validation;

// Re-export types
pub use input::SearchInput;
pub use types::{
    Config, FetcherConfig, OutputConfig, OutputFormat, SiteConfig, DEFAULT_BASE_URL,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_input, parse_config,
    parse_input,
};
pub use validation::{validate, validate_input};
