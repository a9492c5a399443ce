//! Persisted record tables
//!
//! This module handles:
//! - Loading the table a previous run left behind
//! - Deriving the set of known identity keys from it
//! - Merging newly accepted listings into it
//! - Writing it back in a single replace step

mod csv_table;
mod traits;

pub use csv_table::CsvTableStore;
pub(crate) use csv_table::UTF8_BOM;
pub use traits::{StoreError, StoreResult, TableStore};

use crate::record::{Record, ScrapedListing};
use std::collections::HashSet;

/// Column holding the detail URL for URL-identity tables
pub const URL_COLUMN: &str = "URL";

/// How a source decides that a listing is already known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityStrategy {
    /// Identity is the detail URL, which is persisted as a column
    Url,
    /// Identity is the tuple of all field values; the URL is discarded
    Fingerprint,
}

impl IdentityStrategy {
    /// Whether URL-known listings can be skipped before fetching them
    pub fn skips_before_fetch(&self) -> bool {
        matches!(self, Self::Url)
    }

    pub fn keeps_url(&self) -> bool {
        matches!(self, Self::Url)
    }
}

/// One persisted row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub url: Option<String>,
    pub record: Record,
}

impl TableRow {
    /// Builds the row a listing is persisted as under `identity`
    pub fn from_listing(listing: ScrapedListing, identity: IdentityStrategy) -> Self {
        Self {
            url: identity.keeps_url().then_some(listing.url),
            record: listing.record,
        }
    }
}

/// An ordered table of records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTable {
    identity: IdentityStrategy,
    rows: Vec<TableRow>,
}

impl PersistedTable {
    pub fn new(identity: IdentityStrategy) -> Self {
        Self {
            identity,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(identity: IdentityStrategy, rows: Vec<TableRow>) -> Self {
        Self { identity, rows }
    }

    pub fn identity(&self) -> IdentityStrategy {
        self.identity
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.rows.iter().map(|r| &r.record)
    }

    /// Returns old rows followed by the new listings
    ///
    /// URL-identity tables drop new rows whose URL is already present.
    /// Fingerprint tables keep everything; see [`PersistedTable::dedup`].
    pub fn merged(&self, listings: Vec<ScrapedListing>) -> PersistedTable {
        let mut rows = self.rows.clone();
        let mut seen: HashSet<String> = match self.identity {
            IdentityStrategy::Url => rows.iter().filter_map(|r| r.url.clone()).collect(),
            IdentityStrategy::Fingerprint => HashSet::new(),
        };

        for listing in listings {
            let row = TableRow::from_listing(listing, self.identity);
            if let (IdentityStrategy::Url, Some(url)) = (self.identity, &row.url) {
                if !seen.insert(url.clone()) {
                    continue;
                }
            }
            rows.push(row);
        }

        PersistedTable {
            identity: self.identity,
            rows,
        }
    }

    /// Drops rows whose field values repeat an earlier row
    ///
    /// Returns the number of rows removed.
    pub fn dedup(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.record.fingerprint()));
        before - self.rows.len()
    }
}

/// Identity keys of everything already persisted
///
/// Built once when a source run starts and read-only afterwards.
#[derive(Debug, Clone)]
pub struct KnownKeySet {
    identity: IdentityStrategy,
    keys: HashSet<String>,
}

impl KnownKeySet {
    pub fn empty(identity: IdentityStrategy) -> Self {
        Self {
            identity,
            keys: HashSet::new(),
        }
    }

    pub fn from_table(table: &PersistedTable) -> Self {
        let keys = match table.identity() {
            IdentityStrategy::Url => table.rows().iter().filter_map(|r| r.url.clone()).collect(),
            IdentityStrategy::Fingerprint => {
                table.records().map(Record::fingerprint).collect()
            }
        };
        Self {
            identity: table.identity(),
            keys,
        }
    }

    pub fn identity(&self) -> IdentityStrategy {
        self.identity
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether a detail URL is known; always false for fingerprint identity
    pub fn contains_url(&self, url: &str) -> bool {
        self.identity == IdentityStrategy::Url && self.keys.contains(url)
    }

    /// Whether an extracted listing is known
    pub fn contains_listing(&self, listing: &ScrapedListing) -> bool {
        match self.identity {
            IdentityStrategy::Url => self.keys.contains(&listing.url),
            IdentityStrategy::Fingerprint => self.keys.contains(&listing.record.fingerprint()),
        }
    }
}
