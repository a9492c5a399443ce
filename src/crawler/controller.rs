//! Page-budget controller - the sequential listing loop
//!
//! Listing pages are visited one at a time, starting at page 1. For each
//! page the controller:
//! - Discovers detail links
//! - Drops links seen earlier in the run and, for URL identity, links
//!   already persisted
//! - Caps the batch and hands it to the worker pool
//! - Drops accepted listings whose fingerprint is already persisted
//!
//! After every page the [`PageBudget`] decides whether to continue. A page
//! without any link new to the run ends the listing, since pagination the
//! server ignores keeps returning the first page.

use crate::context::RunContext;
use crate::crawler::{discover_page, process_batch};
use crate::output::{RecordObserver, RunReport, StopReason};
use crate::record::ScrapedListing;
use crate::sites::SiteAdapter;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Termination rules for the listing loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBudget {
    pub max_pages: u32,
    pub target: usize,
}

impl PageBudget {
    pub fn new(max_pages: u32, target: usize) -> Self {
        Self { max_pages, target }
    }

    /// Decides whether the loop stops after page `page` (1-based)
    ///
    /// # Arguments
    ///
    /// * `page` - The page just processed
    /// * `new_links` - Detail links on that page not seen earlier in the run,
    ///   including ones already persisted
    /// * `accepted_total` - Records accepted so far in this run
    ///
    /// # Returns
    ///
    /// * `Some(reason)` - The loop ends
    /// * `None` - Continue with the next page
    pub fn after_page(
        &self,
        page: u32,
        new_links: usize,
        accepted_total: usize,
    ) -> Option<StopReason> {
        if new_links == 0 {
            Some(StopReason::Exhausted)
        } else if accepted_total >= self.target {
            Some(StopReason::TargetMet)
        } else if page >= self.max_pages {
            Some(StopReason::BudgetExhausted)
        } else {
            None
        }
    }
}

/// Walks the listing pages of one source and returns the new listings
///
/// Counters and the stop reason are written into `report`.
pub async fn crawl_pages(
    ctx: &RunContext,
    adapter: Arc<dyn SiteAdapter>,
    base: &Url,
    observer: &dyn RecordObserver,
    report: &mut RunReport,
) -> Vec<ScrapedListing> {
    let budget = PageBudget::new(ctx.settings.max_pages, ctx.settings.target_records);
    let mut seen: HashSet<String> = HashSet::new();
    let mut accepted: Vec<ScrapedListing> = Vec::new();
    let mut page = 1;

    loop {
        let links = discover_page(ctx, adapter.as_ref(), base, page).await;
        report.pages_visited = page;
        report.links_discovered += links.len();
        let links_found = links.len();

        let mut new_links = 0;
        let mut batch = Vec::new();
        for link in links {
            if !seen.insert(link.clone()) {
                continue;
            }
            new_links += 1;
            if ctx.known.contains_url(&link) {
                report.skipped_known += 1;
                continue;
            }
            match Url::parse(&link) {
                Ok(url) => batch.push(url),
                Err(e) => tracing::debug!("Skipping unparsable link {}: {}", link, e),
            }
        }

        if batch.len() > ctx.settings.max_batch_size {
            tracing::debug!(
                "Page {}: capping batch of {} to {}",
                page,
                batch.len(),
                ctx.settings.max_batch_size
            );
            batch.truncate(ctx.settings.max_batch_size);
        }

        if !batch.is_empty() {
            tracing::info!(
                "[{}] page {}: {} links, {} to fetch",
                adapter.kind(),
                page,
                links_found,
                batch.len()
            );
            report.dispatched += batch.len();

            let outcome = process_batch(ctx, Arc::clone(&adapter), batch, observer).await;
            report.rejected += outcome.rejected;
            report.failed += outcome.failed;

            for listing in outcome.accepted {
                if ctx.known.contains_listing(&listing) {
                    report.skipped_known += 1;
                    continue;
                }
                accepted.push(listing);
            }
            report.accepted = accepted.len();
        }

        if let Some(reason) = budget.after_page(page, new_links, accepted.len()) {
            report.finish(reason);
            break;
        }

        page += 1;
        tokio::time::sleep(ctx.settings.page_delay()).await;
    }

    accepted
}
