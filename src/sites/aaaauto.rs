//! AAA Auto (aaaauto.cz)
//!
//! Detail pages carry the price in a highlighted `strong`, attributes as
//! `<li>` items with the value in a nested `<strong>`, and a headline of the
//! form `<h1>Brand <span class="regular">Model, Year</span></h1>`.
//!
//! Records are identified by their field fingerprint; the URL is not kept.

use crate::extract::{element_text, first_text, match_label, selector, Extraction};
use crate::record::{is_year, Field};
use crate::sites::{Pagination, SiteAdapter, SiteKind};
use crate::store::IdentityStrategy;
use scraper::{ElementRef, Html};
use url::Url;

const DETAIL_MARKER: &str = "car.html";
const PRICE: &str = "strong.carCard__price-value.carCard__price-value--big";
const HEADLINE: &str = "h1.h2.mb5.notranslate";

#[derive(Debug, Clone)]
pub struct Aaaauto {
    origin: Url,
    pagination: Pagination,
}

impl Aaaauto {
    pub fn new(origin: Url, pagination: Pagination) -> Self {
        Self { origin, pagination }
    }
}

impl SiteAdapter for Aaaauto {
    fn kind(&self) -> SiteKind {
        SiteKind::Aaaauto
    }

    fn origin(&self) -> &Url {
        &self.origin
    }

    fn identity(&self) -> IdentityStrategy {
        IdentityStrategy::Fingerprint
    }

    fn pagination(&self) -> Pagination {
        self.pagination
    }

    fn is_listing_link(&self, _anchor: ElementRef<'_>, href: &str) -> bool {
        href.contains(DETAIL_MARKER)
    }

    fn primary_tier(&self, document: &Html, extraction: &mut Extraction) {
        if let Some(price) = first_text(document, PRICE) {
            extraction.assign(Field::Price, &price);
        }

        let (Some(li_sel), Some(strong_sel)) = (selector("li"), selector("strong")) else {
            return;
        };

        // Equipment lists share the markup, so only labelled items count
        for li in document.select(&li_sel) {
            let text = element_text(li);
            let Some(strong) = li.select(&strong_sel).next() else {
                continue;
            };
            let value = element_text(strong);
            let label = text.replacen(&value, "", 1);

            if let Some(field) = match_label(&label) {
                extraction.assign(field, &value);
            }
        }
    }

    fn secondary_tier(&self, document: &Html, _url: &Url, extraction: &mut Extraction) {
        let (Some(h1_sel), Some(span_sel)) = (selector(HEADLINE), selector("span.regular")) else {
            return;
        };
        let Some(h1) = document.select(&h1_sel).next() else {
            return;
        };
        let Some(span) = h1.select(&span_sel).next() else {
            return;
        };

        let span_text = element_text(span);
        let (model, year) = split_model_year(&span_text);
        if let Some(year) = year {
            extraction.assign(Field::Year, year);
        }
        if !model.is_empty() {
            extraction.assign(Field::Model, model);
        }

        let brand = element_text(h1).replacen(&span_text, "", 1);
        extraction.assign(Field::Brand, brand.trim());
    }
}

/// Splits "Model, Year" or "Model Year"
///
/// The year is only returned when the trailing part is a plausible year;
/// otherwise the whole text is the model.
fn split_model_year(text: &str) -> (&str, Option<&str>) {
    let text = text.trim();
    let split = text.split_once(',').or_else(|| text.rsplit_once(' '));

    match split {
        Some((model, year)) if is_year(year) => (model.trim(), Some(year.trim())),
        Some((model, _)) if text.contains(',') => (model.trim(), None),
        _ => (text, None),
    }
}
