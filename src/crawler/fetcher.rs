//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper, including:
//! - Building the shared HTTP client
//! - GET requests with a per-request timeout
//! - Bounded retries with a fixed or doubling delay
//!
//! A fetch never returns an error: after the last attempt it reports
//! [`FetchResult::Failure`] and callers treat that as "no data".

use crate::config::{Backoff, FetcherConfig};
use reqwest::Client;
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Every attempt failed
    Failure {
        /// Number of attempts made
        attempts: u32,
        /// Description of the last failure
        error: String,
    },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The body on success
    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Success { body, .. } => Some(body),
            Self::Failure { .. } => None,
        }
    }
}

/// Retry bound and delay schedule for one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per URL, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub delay: Duration,
    pub backoff: Backoff,
    /// Per-request timeout
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            delay: Duration::from_millis(config.retry_delay_ms),
            backoff: config.backoff,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Delay after failed attempt `attempt` (1-based), `None` after the last
    ///
    /// Delays never decrease from one attempt to the next.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        match self.backoff {
            Backoff::Fixed => Some(self.delay),
            Backoff::Doubling => {
                let factor = 1u32 << (attempt - 1).min(16);
                Some(self.delay.saturating_mul(factor))
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetcherConfig::default())
    }
}

/// Builds the HTTP client shared by all workers
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL, retrying transient failures
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx | Success |
/// | Any other status | Retry |
/// | Timeout / connection error | Retry |
/// | Body read error | Retry |
///
/// After `policy.max_attempts` failed attempts the last error is reported
/// as [`FetchResult::Failure`].
pub async fn fetch_url(client: &Client, url: &str, policy: &RetryPolicy) -> FetchResult {
    let mut attempt = 0;

    loop {
        attempt += 1;

        let error = match try_fetch(client, url, policy.timeout).await {
            Ok(result) => return result,
            Err(error) => error,
        };

        tracing::debug!(
            "Fetch {} failed (attempt {}/{}): {}",
            url,
            attempt,
            policy.max_attempts,
            error
        );

        match policy.delay_after(attempt) {
            Some(delay) => tokio::time::sleep(delay).await,
            None => {
                tracing::warn!("Giving up on {} after {} attempts: {}", url, attempt, error);
                return FetchResult::Failure {
                    attempts: attempt,
                    error,
                };
            }
        }
    }
}

/// One GET attempt; `Err` carries a description of a retryable failure
async fn try_fetch(client: &Client, url: &str, timeout: Duration) -> Result<FetchResult, String> {
    let response = client.get(url).timeout(timeout).send().await.map_err(|e| {
        if e.is_timeout() {
            "Request timeout".to_string()
        } else if e.is_connect() {
            format!("Connection error: {}", e)
        } else {
            e.to_string()
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {}", status.as_u16()));
    }

    let final_url = response.url().to_string();
    let body = response.text().await.map_err(|e| e.to_string())?;

    Ok(FetchResult::Success {
        final_url,
        status_code: status.as_u16(),
        body,
    })
}
