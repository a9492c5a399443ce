//! Output module for run observability and table statistics
//!
//! This module handles:
//! - Reporting each resolved detail task while a batch runs
//! - Summarising a finished source run
//! - Computing and printing statistics over persisted tables

mod report;
pub mod stats;

pub use report::{log_report, RunReport, StopReason};
pub use stats::{print_statistics, TableStatistics};

use crate::record::ScrapedListing;

/// Receives pipeline events as detail tasks resolve
///
/// Called from the single collection point of a batch, never from inside
/// extraction.
pub trait RecordObserver: Send + Sync {
    /// A complete record was accepted
    fn on_accepted(&self, _listing: &ScrapedListing) {}

    /// A record missed at least one field
    fn on_rejected(&self, _listing: &ScrapedListing) {}

    /// A task ended without producing a record
    fn on_failed(&self, _error: &str) {}
}

/// Logs every event through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RecordObserver for TracingObserver {
    fn on_accepted(&self, listing: &ScrapedListing) {
        tracing::info!("Accepted {}: {}", listing.url, listing.record);
    }

    fn on_rejected(&self, listing: &ScrapedListing) {
        let missing: Vec<String> = listing
            .record
            .missing_fields()
            .iter()
            .map(|f| f.to_string())
            .collect();
        tracing::debug!("Rejected {} (missing {})", listing.url, missing.join(", "));
    }

    fn on_failed(&self, error: &str) {
        tracing::error!("Detail task failed: {}", error);
    }
}

/// Ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl RecordObserver for SilentObserver {}
