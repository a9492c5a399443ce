//! Configuration module for Auto-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use auto_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Scraping at most {} pages per source", config.scraper.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Backoff, Config, FetcherConfig, OutputConfig, ScraperConfig, SourceConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
