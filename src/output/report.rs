//! Summary of one source run

use chrono::{DateTime, Utc};
use std::fmt;

/// Why a run stopped requesting listing pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A listing page yielded no detail links
    Exhausted,
    /// Enough records were accepted
    TargetMet,
    /// The page budget ran out
    BudgetExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Exhausted => "listing exhausted",
            Self::TargetMet => "target met",
            Self::BudgetExhausted => "page budget exhausted",
        };
        f.write_str(s)
    }
}

/// Counters for one source run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub pages_visited: u32,
    pub links_discovered: usize,
    pub skipped_known: usize,
    pub dispatched: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub failed: usize,
    pub stop_reason: Option<StopReason>,
    /// Rows in the table after the merge
    pub table_rows: usize,
}

impl RunReport {
    pub fn start(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            started_at: Utc::now(),
            finished_at: None,
            pages_visited: 0,
            links_discovered: 0,
            skipped_known: 0,
            dispatched: 0,
            accepted: 0,
            rejected: 0,
            failed: 0,
            stop_reason: None,
            table_rows: 0,
        }
    }

    pub fn finish(&mut self, reason: StopReason) {
        self.stop_reason = Some(reason);
        self.finished_at = Some(Utc::now());
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_seconds())
    }
}

/// Logs a finished run
pub fn log_report(report: &RunReport) {
    tracing::info!(
        "[{}] stopped: {} after {} pages in {}s",
        report.source,
        report
            .stop_reason
            .map(|r| r.to_string())
            .unwrap_or_else(|| "unfinished".to_string()),
        report.pages_visited,
        report.duration_seconds().unwrap_or(0)
    );
    tracing::info!(
        "[{}] links: {} discovered, {} already known, {} fetched",
        report.source,
        report.links_discovered,
        report.skipped_known,
        report.dispatched
    );
    tracing::info!(
        "[{}] records: {} accepted, {} incomplete, {} failed; table now {} rows",
        report.source,
        report.accepted,
        report.rejected,
        report.failed,
        report.table_rows
    );
}
