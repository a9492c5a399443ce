//! Site adapters
//!
//! Each supported classifieds site is a [`SiteAdapter`]: how its listing
//! pages are paginated, which anchors lead to detail pages, and the
//! extraction tiers for its detail pages. The pipeline itself is shared.

mod aaaauto;
mod sauto;

pub use aaaauto::Aaaauto;
pub use sauto::Sauto;

use crate::config::SourceConfig;
use crate::extract::{label_table_tier, Extraction};
use crate::store::IdentityStrategy;
use crate::HarvestError;
use scraper::{ElementRef, Html};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Supported source sites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteKind {
    Aaaauto,
    Sauto,
}

impl SiteKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Aaaauto => "aaaauto",
            Self::Sauto => "sauto",
        }
    }

    /// Pagination used when the config does not name one
    pub fn default_pagination(&self) -> Pagination {
        Pagination::Query
    }
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a listing page number is encoded in its URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pagination {
    /// `{base}?page={n}`
    Query,
    /// `{base}` for the first page, `{base}#!&page={n}` after it
    Fragment,
}

impl Pagination {
    /// Builds the URL of listing page `page` (1-based)
    pub fn page_url(&self, base: &Url, page: u32) -> Url {
        let mut url = base.clone();
        match self {
            Self::Query => {
                let kept: Vec<(String, String)> = base
                    .query_pairs()
                    .filter(|(k, _)| k != "page")
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                url.set_query(None);
                {
                    let mut pairs = url.query_pairs_mut();
                    for (k, v) in &kept {
                        pairs.append_pair(k, v);
                    }
                    pairs.append_pair("page", &page.to_string());
                }
            }
            Self::Fragment => {
                if page <= 1 {
                    url.set_fragment(None);
                } else {
                    url.set_fragment(Some(&format!("!&page={}", page)));
                }
            }
        }
        url
    }
}

/// Site-specific behavior of the scraping pipeline
pub trait SiteAdapter: Send + Sync {
    fn kind(&self) -> SiteKind;

    /// Origin that relative links are resolved against
    fn origin(&self) -> &Url;

    /// How persisted records of this site are identified
    fn identity(&self) -> IdentityStrategy;

    fn pagination(&self) -> Pagination;

    fn page_url(&self, base: &Url, page: u32) -> Url {
        self.pagination().page_url(base, page)
    }

    /// Whether an anchor on a listing page leads to a detail page
    fn is_listing_link(&self, anchor: ElementRef<'_>, href: &str) -> bool;

    /// Price block and attribute list
    fn primary_tier(&self, document: &Html, extraction: &mut Extraction);

    /// Headline parsing; `url` is the detail page address
    fn secondary_tier(&self, document: &Html, url: &Url, extraction: &mut Extraction);

    /// Generic label/value table
    fn tertiary_tier(&self, document: &Html, extraction: &mut Extraction) {
        label_table_tier(document, extraction);
    }

    /// Brand/model from the detail URL
    fn url_tier(&self, _url: &Url, _extraction: &mut Extraction) {}
}

/// Builds the adapter for a configured source
pub fn adapter_for(source: &SourceConfig) -> Result<Arc<dyn SiteAdapter>, HarvestError> {
    let base = Url::parse(&source.base_url)?;
    let origin = base.join("/")?;
    let pagination = source
        .pagination
        .unwrap_or_else(|| source.site.default_pagination());

    let adapter: Arc<dyn SiteAdapter> = match source.site {
        SiteKind::Aaaauto => Arc::new(Aaaauto::new(origin, pagination)),
        SiteKind::Sauto => Arc::new(Sauto::new(origin, pagination)),
    };
    Ok(adapter)
}
