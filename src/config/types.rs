use crate::sites::{Pagination, SiteKind};
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Auto-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(rename = "source", default)]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Finds a configured source by site name
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.site.name() == name)
    }
}

/// Page budget and worker pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScraperConfig {
    /// Maximum number of listing pages requested per source
    pub max_pages: u32,

    /// Stop once this many records were accepted in a run
    pub target_records: usize,

    /// Maximum number of detail URLs dispatched per listing page
    pub max_batch_size: usize,

    /// Number of concurrent detail fetches
    pub workers: usize,

    /// Delay between sequential listing page requests (milliseconds)
    pub page_delay_ms: u64,
}

impl ScraperConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

/// Delay growth between fetch attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// Same delay before every retry
    #[default]
    Fixed,
    /// Delay doubles after each failed attempt
    Doubling,
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FetcherConfig {
    /// Attempts per URL, including the first one
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds)
    pub retry_delay_ms: u64,

    pub backoff: Backoff,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 500,
            backoff: Backoff::Fixed,
            timeout_secs: 30,
            user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Path of the cleaned, merged dataset written by `--clean`
    pub cleaned_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            cleaned_path: "data/auta_cleaned.csv".to_string(),
        }
    }
}

/// One classifieds site to scrape
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceConfig {
    pub site: SiteKind,

    /// First listing page, without pagination
    pub base_url: String,

    /// CSV table accumulating this source's records
    pub output_path: String,

    /// Overrides the site's default pagination style
    #[serde(default)]
    pub pagination: Option<Pagination>,
}
