//! Per-run context
//!
//! Everything the pipeline components share during one source run: the HTTP
//! client, the retry policy, the scraper settings and the identity keys
//! already persisted. It is built once per run and passed explicitly.

use crate::config::{Config, ScraperConfig};
use crate::crawler::{build_http_client, RetryPolicy};
use crate::store::KnownKeySet;
use reqwest::Client;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RunContext {
    /// Shared connection pool, safe for concurrent use by workers
    pub client: Client,
    pub retry: RetryPolicy,
    pub settings: ScraperConfig,
    /// Read-only for the whole run
    pub known: Arc<KnownKeySet>,
}

impl RunContext {
    pub fn new(
        client: Client,
        retry: RetryPolicy,
        settings: ScraperConfig,
        known: KnownKeySet,
    ) -> Self {
        Self {
            client,
            retry,
            settings,
            known: Arc::new(known),
        }
    }

    /// Builds a context from configuration with a fresh client
    pub fn from_config(config: &Config, known: KnownKeySet) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.fetcher)?;
        Ok(Self::new(
            client,
            RetryPolicy::from_config(&config.fetcher),
            config.scraper.clone(),
            known,
        ))
    }
}
