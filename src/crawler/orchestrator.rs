//! Concurrent detail page processing
//!
//! One task per detail URL is spawned onto the runtime; a semaphore caps how
//! many of them run at once. Results are collected in completion order at a
//! single point, where the completeness filter and the observer are applied.
//! A task that panics is logged there and counted as failed; its siblings
//! keep running.

use crate::context::RunContext;
use crate::extract::extract;
use crate::output::RecordObserver;
use crate::record::{Record, ScrapedListing};
use crate::sites::SiteAdapter;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// What a batch of detail tasks produced
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Complete records, in completion order
    pub accepted: Vec<ScrapedListing>,
    /// Tasks whose record missed a field
    pub rejected: usize,
    /// Tasks that ended without a record
    pub failed: usize,
}

impl BatchOutcome {
    /// Number of tasks accounted for
    pub fn resolved(&self) -> usize {
        self.accepted.len() + self.rejected + self.failed
    }
}

/// Fetches and extracts every URL with `ctx.settings.workers` workers
pub async fn process_batch(
    ctx: &RunContext,
    adapter: Arc<dyn SiteAdapter>,
    urls: Vec<Url>,
    observer: &dyn RecordObserver,
) -> BatchOutcome {
    let task_ctx = ctx.clone();
    run_pool(
        urls,
        ctx.settings.workers,
        move |url| {
            let ctx = task_ctx.clone();
            let adapter = Arc::clone(&adapter);
            async move { extract(&ctx, adapter.as_ref(), &url).await }
        },
        observer,
    )
    .await
}

/// Runs `task` for every URL on a pool of `workers` concurrent tasks
///
/// # Arguments
///
/// * `urls` - Detail URLs, one task each
/// * `workers` - Maximum number of tasks running at once
/// * `task` - Produces the record for one URL
/// * `observer` - Notified as each task resolves
pub async fn run_pool<F, Fut>(
    urls: Vec<Url>,
    workers: usize,
    task: F,
    observer: &dyn RecordObserver,
) -> BatchOutcome
where
    F: Fn(Url) -> Fut,
    Fut: Future<Output = Record> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();

    for url in urls {
        let semaphore = Arc::clone(&semaphore);
        let work = task(url.clone());
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let record = work.await;
            ScrapedListing {
                url: url.to_string(),
                record,
            }
        });
    }

    let mut outcome = BatchOutcome::default();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(listing) if listing.record.is_complete() => {
                observer.on_accepted(&listing);
                outcome.accepted.push(listing);
            }
            Ok(listing) => {
                observer.on_rejected(&listing);
                outcome.rejected += 1;
            }
            Err(e) => {
                observer.on_failed(&e.to_string());
                outcome.failed += 1;
            }
        }
    }

    outcome
}
