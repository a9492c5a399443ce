use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at the start of every run so output tables can be traced back to
/// the settings that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backoff;
    use crate::sites::{Pagination, SiteKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID: &str = r#"
[scraper]
max-pages = 20
target-records = 200
max-batch-size = 1000
workers = 5
page-delay-ms = 1000

[fetcher]
max-retries = 3
retry-delay-ms = 500
backoff = "doubling"
timeout-secs = 30
user-agent = "Mozilla/5.0"

[[source]]
site = "aaaauto"
base-url = "https://www.aaaauto.cz/ojete-vozy/"
output-path = "data/auta_aaaauto.csv"
pagination = "fragment"

[[source]]
site = "sauto"
base-url = "https://www.sauto.cz/inzerce/osobni"
output-path = "data/auta_sauto.csv"
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.scraper.max_pages, 20);
        assert_eq!(config.scraper.workers, 5);
        assert_eq!(config.fetcher.backoff, Backoff::Doubling);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].site, SiteKind::Aaaauto);
        assert_eq!(config.sources[0].pagination, Some(Pagination::Fragment));
        assert_eq!(config.sources[1].pagination, None);
        assert!(config.source("sauto").is_some());
        assert_eq!(config.output.cleaned_path, "data/auta_cleaned.csv");
    }

    #[test]
    fn test_fetcher_section_is_optional() {
        let content = r#"
[scraper]
max-pages = 1
target-records = 10
max-batch-size = 10
workers = 2
page-delay-ms = 500

[[source]]
site = "sauto"
base-url = "https://www.sauto.cz/inzerce/osobni"
output-path = "sauto.csv"
"#;
        let file = create_temp_config(content);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.fetcher.max_retries, 3);
        assert_eq!(config.fetcher.backoff, Backoff::Fixed);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_load_config_with_unknown_site() {
        let content = VALID.replace("site = \"sauto\"", "site = \"bazos\"");
        let file = create_temp_config(&content);
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = VALID.replace("workers = 5", "workers = 0");
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");
        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }
}
