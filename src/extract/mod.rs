//! Detail page extraction
//!
//! Extraction runs the tiers of a [`SiteAdapter`] in order over one parsed
//! detail page:
//!
//! 1. primary: price block and attribute list
//! 2. secondary: headline, only while brand, model or year is unknown
//! 3. tertiary: generic two-cell label/value table
//! 4. URL: brand/model segments embedded in the URL path
//!
//! A tier can only fill fields that are still unknown, so an earlier tier's
//! value is never replaced. Transmission is not read from any tier directly;
//! it is inferred from the gearbox values the tiers found.

mod vocabulary;

pub use vocabulary::{infer_transmission, match_label};

use crate::context::RunContext;
use crate::crawler::fetch_url;
use crate::record::{Field, Record};
use crate::sites::SiteAdapter;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// In-progress extraction of one detail page
#[derive(Debug, Default)]
pub struct Extraction {
    record: Record,
    attributes: Vec<String>,
}

impl Extraction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a raw value to `field` if it is still unknown
    ///
    /// Transmission values only count as attribute text.
    pub fn assign(&mut self, field: Field, raw: &str) -> bool {
        if field == Field::Transmission {
            self.note_attribute(raw);
            return false;
        }
        self.record.fill(field, raw)
    }

    /// Records gearbox text for the transmission inference
    pub fn note_attribute(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.attributes.push(text.to_string());
        }
    }

    pub fn is_unknown(&self, field: Field) -> bool {
        self.record.is_unknown(field)
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Resolves transmission and returns the finished record
    pub fn finish(mut self) -> Record {
        let transmission = infer_transmission(self.attributes.iter().map(String::as_str));
        self.record.fill(Field::Transmission, transmission);
        self.record
    }
}

/// Fetches a detail page and extracts a record from it
///
/// Never fails: a page that cannot be fetched yields a record with every
/// field unknown.
pub async fn extract(ctx: &RunContext, adapter: &dyn SiteAdapter, url: &Url) -> Record {
    let body = fetch_url(&ctx.client, url.as_str(), &ctx.retry).await.into_body();

    match body {
        Some(body) => extract_detail(adapter, url, &body),
        None => {
            tracing::debug!("No detail page for {}, record left unknown", url);
            Record::new()
        }
    }
}

/// Runs every extraction tier of `adapter` over a detail page body
pub fn extract_detail(adapter: &dyn SiteAdapter, url: &Url, body: &str) -> Record {
    let document = Html::parse_document(body);
    let mut extraction = Extraction::new();

    adapter.primary_tier(&document, &mut extraction);

    if [Field::Brand, Field::Model, Field::Year]
        .iter()
        .any(|f| extraction.is_unknown(*f))
    {
        adapter.secondary_tier(&document, url, &mut extraction);
    }

    if extraction.record().missing_fields().iter().any(|f| *f != Field::Transmission) {
        adapter.tertiary_tier(&document, &mut extraction);
    }

    if extraction.is_unknown(Field::Brand) || extraction.is_unknown(Field::Model) {
        adapter.url_tier(url, &mut extraction);
    }

    extraction.finish()
}

/// Scans `<tr>` rows with a `<th>` header and a `<td>` value
///
/// Headers are matched against the field vocabulary; the value cell fills
/// the field when it is still unknown.
pub fn label_table_tier(document: &Html, extraction: &mut Extraction) {
    let (Some(row_sel), Some(th_sel), Some(td_sel)) =
        (selector("tr"), selector("th"), selector("td"))
    else {
        return;
    };

    for row in document.select(&row_sel) {
        let (Some(th), Some(td)) = (row.select(&th_sel).next(), row.select(&td_sel).next()) else {
            continue;
        };

        let header = element_text(th);
        let value = element_text(td);

        if let Some(field) = match_label(&header) {
            if field == Field::Transmission || extraction.is_unknown(field) {
                extraction.assign(field, &value);
            }
        }
    }
}

/// Parses a CSS selector, logging instead of failing on a bad one
pub fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            tracing::warn!("Invalid selector '{}': {:?}", css, e);
            None
        }
    }
}

/// Text content of an element with whitespace runs collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first element matching `css`
pub fn first_text(document: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    document
        .select(&sel)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}
