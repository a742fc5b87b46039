use crate::config::types::{
    Config, CrawlerConfig, FetchConfig, OutputConfig, SourceConfig, TaxonomyEntry,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;
    validate_taxonomy(&config.taxonomy)?;
    Ok(())
}

/// Validates the crawled site configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    if config.site.is_empty() {
        return Err(ConfigError::Validation("site cannot be empty".to_string()));
    }

    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "source name cannot be empty".to_string(),
        ));
    }

    validate_http_url("base-url", &config.base_url)?;
    validate_http_url("search-url", &config.search_url)?;

    if config.page_param.is_empty()
        || !config
            .page_param
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "page-param must be a non-empty query parameter name, got '{}'",
            config.page_param
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "page-size must be >= 1, got {}",
            config.page_size
        )));
    }

    if config.max_pages_safety_cap < 1 || config.max_pages_safety_cap > 100 {
        return Err(ConfigError::Validation(format!(
            "max-pages-safety-cap must be between 1 and 100, got {}",
            config.max_pages_safety_cap
        )));
    }

    if config.worker_count < 1 || config.worker_count > 64 {
        return Err(ConfigError::Validation(format!(
            "worker-count must be between 1 and 64, got {}",
            config.worker_count
        )));
    }

    if config.polite_delay_min_ms > config.polite_delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "polite-delay-min-ms ({}) must not exceed polite-delay-max-ms ({})",
            config.polite_delay_min_ms, config.polite_delay_max_ms
        )));
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.max_retries < 1 || config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be between 1 and 10, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates taxonomy entries
fn validate_taxonomy(entries: &[TaxonomyEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in entries {
        let category = entry.category.trim();
        if category.is_empty() {
            return Err(ConfigError::Validation(
                "taxonomy category cannot be empty".to_string(),
            ));
        }

        if !seen.insert(category.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "taxonomy category '{}' is declared twice",
                category
            )));
        }

        if entry.skills.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "taxonomy category '{}' must list at least one skill",
                category
            )));
        }
    }

    Ok(())
}

/// Validates that a value is an absolute http(s) URL with a host
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            field, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crawler() -> CrawlerConfig {
        CrawlerConfig::default()
    }

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("base-url", "https://theprotocol.it").is_ok());
        assert!(validate_http_url("base-url", "http://127.0.0.1:8080/").is_ok());

        assert!(validate_http_url("base-url", "").is_err());
        assert!(validate_http_url("base-url", "ftp://theprotocol.it").is_err());
        assert!(validate_http_url("base-url", "theprotocol.it").is_err());
    }

    #[test]
    fn test_validate_crawler_bounds() {
        assert!(validate_crawler_config(&crawler()).is_ok());

        let mut config = crawler();
        config.page_size = 0;
        assert!(validate_crawler_config(&config).is_err());

        let mut config = crawler();
        config.max_pages_safety_cap = 101;
        assert!(validate_crawler_config(&config).is_err());

        let mut config = crawler();
        config.worker_count = 0;
        assert!(validate_crawler_config(&config).is_err());

        let mut config = crawler();
        config.polite_delay_min_ms = 3000;
        config.polite_delay_max_ms = 1000;
        assert!(validate_crawler_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_polite_delay_allowed() {
        let mut config = crawler();
        config.polite_delay_min_ms = 0;
        config.polite_delay_max_ms = 0;
        assert!(validate_crawler_config(&config).is_ok());
    }

    #[test]
    fn test_validate_fetch_bounds() {
        assert!(validate_fetch_config(&FetchConfig::default()).is_ok());

        let mut config = FetchConfig::default();
        config.timeout_secs = 0;
        assert!(validate_fetch_config(&config).is_err());

        let mut config = FetchConfig::default();
        config.max_retries = 0;
        assert!(validate_fetch_config(&config).is_err());
    }

    #[test]
    fn test_validate_taxonomy() {
        let entry = |category: &str, skills: &[&str]| TaxonomyEntry {
            category: category.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
        };

        assert!(validate_taxonomy(&[]).is_ok());
        assert!(validate_taxonomy(&[entry("Languages", &["python"])]).is_ok());

        assert!(validate_taxonomy(&[entry("", &["python"])]).is_err());
        assert!(validate_taxonomy(&[entry("Languages", &[])]).is_err());
        assert!(validate_taxonomy(&[entry("Languages", &["  "])]).is_err());
        assert!(validate_taxonomy(&[
            entry("Languages", &["python"]),
            entry("languages", &["sql"]),
        ])
        .is_err());
    }
}
