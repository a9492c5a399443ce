//! Auto-Harvest: a used-car listing harvester
//!
//! This crate walks the paginated listing pages of two classifieds sites,
//! extracts structured car records from each detail page and accumulates
//! the complete ones in a CSV table without re-admitting known listings.

pub mod clean;
pub mod config;
pub mod context;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod record;
pub mod sites;
pub mod store;

use thiserror::Error;

/// Main error type for Auto-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Persistence error: {0}")]
    Store(#[from] store::StoreError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown source '{0}'")]
    UnknownSource(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Auto-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use context::RunContext;
pub use record::{Field, Record, ScrapedListing, UNKNOWN};
pub use sites::{SiteAdapter, SiteKind};
pub use store::{IdentityStrategy, KnownKeySet, PersistedTable};
