use crate::config::input::SearchInput;
use crate::config::types::{Config, FetcherConfig, OutputConfig, SiteConfig};
use crate::query::Pagination;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the target site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' has no host",
            config.base_url
        )));
    }

    match &config.pagination {
        Pagination::PathSegment { first_page } if *first_page > 1 => {
            Err(ConfigError::Validation(format!(
                "pagination first-page must be 0 or 1, got {}",
                first_page
            )))
        }
        Pagination::QueryOffset { param, page_size } => {
            if param.is_empty() {
                return Err(ConfigError::Validation(
                    "pagination param cannot be empty".to_string(),
                ));
            }
            if *page_size == 0 {
                return Err(ConfigError::Validation(
                    "pagination page-size must be >= 1".to_string(),
                ));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.backoff_max_ms < config.backoff_base_ms {
        return Err(ConfigError::Validation(format!(
            "backoff-max-ms ({}) must be >= backoff-base-ms ({})",
            config.backoff_max_ms, config.backoff_base_ms
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a search input against the input schema ranges
pub fn validate_input(input: &SearchInput) -> Result<(), ConfigError> {
    if input.max_results < 1 || input.max_results > 1000 {
        return Err(ConfigError::Validation(format!(
            "max_results must be between 1 and 1000, got {}",
            input.max_results
        )));
    }

    if input.pages_to_scrape < 1 || input.pages_to_scrape > 100 {
        return Err(ConfigError::Validation(format!(
            "pages_to_scrape must be between 1 and 100, got {}",
            input.pages_to_scrape
        )));
    }

    if input.job_category.trim().is_empty() {
        return Err(ConfigError::Validation(
            "job_category cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_base_url() {
        let mut config = Config::default();
        config.site.base_url = "not a url".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidUrl(_)
        ));

        config.site.base_url = "ftp://internshala.com/".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_pagination() {
        let mut config = Config::default();
        config.site.pagination = Pagination::QueryOffset {
            param: "offset".to_string(),
            page_size: 0,
        };
        assert!(validate(&config).is_err());

        config.site.pagination = Pagination::PathSegment { first_page: 2 };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_fetcher() {
        let mut config = Config::default();
        config.fetcher.max_attempts = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.fetcher.backoff_base_ms = 5000;
        config.fetcher.backoff_max_ms = 100;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_input_ranges() {
        assert!(validate_input(&SearchInput::default()).is_ok());

        let input = SearchInput {
            max_results: 0,
            ..SearchInput::default()
        };
        assert!(validate_input(&input).is_err());

        let input = SearchInput {
            max_results: 1001,
            ..SearchInput::default()
        };
        assert!(validate_input(&input).is_err());

        let input = SearchInput {
            pages_to_scrape: 101,
            ..SearchInput::default()
        };
        assert!(validate_input(&input).is_err());

        let input = SearchInput {
            job_category: "  ".to_string(),
            ..SearchInput::default()
        };
        assert!(validate_input(&input).is_err());
    }
}
