//! Crawler module for listing traversal and detail processing
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with retry logic
//! - Listing page link discovery
//! - Concurrent detail page processing
//! - The page-budget controlled listing loop

mod controller;
mod discover;
mod fetcher;
mod orchestrator;

pub use controller::{crawl_pages, PageBudget};
pub use discover::{collect_listing_links, discover_page};
pub use fetcher::{build_http_client, fetch_url, FetchResult, RetryPolicy};
pub use orchestrator::{process_batch, run_pool, BatchOutcome};

use crate::config::{Config, SourceConfig};
use crate::context::RunContext;
use crate::output::{log_report, RecordObserver, RunReport, TracingObserver};
use crate::sites::adapter_for;
use crate::store::{CsvTableStore, KnownKeySet, TableStore};
use crate::HarvestError;
use url::Url;

/// Runs one source end to end
///
/// This will:
/// 1. Load the persisted table (a load failure is fatal)
/// 2. Derive the known identity keys from it
/// 3. Walk the listing pages and process detail batches
/// 4. Merge the new listings and replace the table if anything was added
///
/// # Arguments
///
/// * `config` - The scraper configuration
/// * `source` - The source to run
/// * `store` - Where the source's table lives
/// * `observer` - Notified as detail tasks resolve
///
/// # Returns
///
/// * `Ok(RunReport)` - The run finished and the table is consistent
/// * `Err(HarvestError)` - The table could not be loaded or written
pub async fn run_source(
    config: &Config,
    source: &SourceConfig,
    store: &dyn TableStore,
    observer: &dyn RecordObserver,
) -> Result<RunReport, HarvestError> {
    let adapter = adapter_for(source)?;
    let base = Url::parse(&source.base_url)?;
    let mut report = RunReport::start(source.site.name());

    let table = store.load()?;
    let known = KnownKeySet::from_table(&table);
    tracing::info!(
        "[{}] {} rows in {}, {} known keys",
        source.site,
        table.len(),
        store.describe(),
        known.len()
    );

    let ctx = RunContext::from_config(config, known)?;
    let listings = crawl_pages(&ctx, adapter, &base, observer, &mut report).await;

    let new_count = listings.len();
    let merged = table.merged(listings);
    if merged.len() > table.len() {
        store.save(&merged)?;
        tracing::info!(
            "[{}] wrote {} new rows to {}",
            source.site,
            merged.len() - table.len(),
            store.describe()
        );
    } else {
        tracing::info!(
            "[{}] nothing new to write ({} candidates)",
            source.site,
            new_count
        );
    }
    report.table_rows = merged.len();

    Ok(report)
}

/// Runs every configured source in order, or only the one named `only`
///
/// Sources run one after another; the first persistence failure aborts the
/// remaining sources.
pub async fn run_all(config: &Config, only: Option<&str>) -> Result<Vec<RunReport>, HarvestError> {
    let sources: Vec<&SourceConfig> = match only {
        Some(name) => vec![config
            .source(name)
            .ok_or_else(|| HarvestError::UnknownSource(name.to_string()))?],
        None => config.sources.iter().collect(),
    };

    let observer = TracingObserver;
    let mut reports = Vec::with_capacity(sources.len());

    for source in sources {
        let identity = adapter_for(source)?.identity();
        let store = CsvTableStore::new(&source.output_path, identity);
        let report = run_source(config, source, &store, &observer).await?;
        log_report(&report);
        reports.push(report);
    }

    Ok(reports)
}
