use crate::config::types::{Config, FetcherConfig, ScraperConfig, SourceConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_sources(&config.sources)?;

    if config.output.cleaned_path.is_empty() {
        return Err(ConfigError::Validation(
            "cleaned-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates page budget and worker pool settings
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 100 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 100, got {}",
            config.workers
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1".to_string(),
        ));
    }

    if config.target_records < 1 {
        return Err(ConfigError::Validation(
            "target-records must be >= 1".to_string(),
        ));
    }

    if config.max_batch_size < 1 {
        return Err(ConfigError::Validation(
            "max-batch-size must be >= 1".to_string(),
        ));
    }

    if config.page_delay_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "page-delay-ms must be >= 100ms, got {}ms",
            config.page_delay_ms
        )));
    }

    Ok(())
}

fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 || config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be between 1 and 10, got {}",
            config.max_retries
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates source entries
fn validate_sources(sources: &[SourceConfig]) -> Result<(), ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[source]] must be configured".to_string(),
        ));
    }

    let mut outputs = HashSet::new();
    for source in sources {
        let url = Url::parse(&source.base_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", source.base_url, e))
        })?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::InvalidUrl(format!(
                "base-url '{}' must use http or https",
                source.base_url
            )));
        }

        if source.output_path.is_empty() {
            return Err(ConfigError::Validation(format!(
                "output-path cannot be empty for source '{}'",
                source.site
            )));
        }

        if !outputs.insert(source.output_path.as_str()) {
            return Err(ConfigError::Validation(format!(
                "output-path '{}' is used by more than one source",
                source.output_path
            )));
        }
    }

    Ok(())
}
