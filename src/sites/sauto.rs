//! Sauto (sauto.cz)
//!
//! Detail pages carry a headline (`h1.c-item-title`), a subtitle encoding
//! "condition, month/year, mileage", a price block and attribute tiles.
//! Detail URLs embed brand and model: `/detail/{brand}/{model}/{id}`.
//!
//! Records are identified by URL, which is kept in the persisted table.

use crate::extract::{element_text, first_text, match_label, selector, Extraction};
use crate::record::{is_year, Field};
use crate::sites::{Pagination, SiteAdapter, SiteKind};
use crate::store::IdentityStrategy;
use scraper::{ElementRef, Html};
use url::Url;

const LINK_CLASS: &str = "c-item__link";
const HEADLINE: &str = "h1.c-item-title";
const SUBTITLE: &str = "span.c-a-basic-info__subtitle-info";
const PRICE: &str = "div.c-a-basic-info__price";
const PRICE_FALLBACK: &str = "span.c-basic-info__price";
const TILE: &str = "li.c-car-properties__tile";
const TILE_LABEL: &str = "div.c-car-properties__tile-label";
const TILE_VALUE: &str = "div.c-car-properties__tile-value";

#[derive(Debug, Clone)]
pub struct Sauto {
    origin: Url,
    pagination: Pagination,
}

impl Sauto {
    pub fn new(origin: Url, pagination: Pagination) -> Self {
        Self { origin, pagination }
    }
}

impl SiteAdapter for Sauto {
    fn kind(&self) -> SiteKind {
        SiteKind::Sauto
    }

    fn origin(&self) -> &Url {
        &self.origin
    }

    fn identity(&self) -> IdentityStrategy {
        IdentityStrategy::Url
    }

    fn pagination(&self) -> Pagination {
        self.pagination
    }

    fn is_listing_link(&self, anchor: ElementRef<'_>, _href: &str) -> bool {
        anchor.value().classes().any(|c| c == LINK_CLASS)
    }

    fn primary_tier(&self, document: &Html, extraction: &mut Extraction) {
        let price = first_text(document, PRICE).or_else(|| first_text(document, PRICE_FALLBACK));
        if let Some(price) = price {
            extraction.assign(Field::Price, &price);
        }

        if let Some(subtitle) = first_text(document, SUBTITLE) {
            read_subtitle(&subtitle, extraction);
        }

        let (Some(tile_sel), Some(label_sel), Some(value_sel)) =
            (selector(TILE), selector(TILE_LABEL), selector(TILE_VALUE))
        else {
            return;
        };

        for tile in document.select(&tile_sel) {
            let (Some(label), Some(value)) = (
                tile.select(&label_sel).next(),
                tile.select(&value_sel).next(),
            ) else {
                continue;
            };

            let label = element_text(label);
            let value = element_text(value);

            if let Some(field) = match_label(&label) {
                extraction.assign(field, &value);
            }
        }
    }

    fn secondary_tier(&self, document: &Html, url: &Url, extraction: &mut Extraction) {
        let Some(title) = first_text(document, HEADLINE) else {
            return;
        };

        let Some((name, extra)) = title.split_once(',') else {
            match title.trim().split_once(' ') {
                Some((brand, model)) => {
                    extraction.assign(Field::Brand, brand);
                    extraction.assign(Field::Model, model);
                }
                None => {
                    extraction.assign(Field::Brand, title.trim());
                }
            }
            return;
        };
        let (name, extra) = (name.trim(), extra.trim());

        // Brands can span several words; the URL separates brand from model
        let (brand, model) = match detail_segments(url) {
            Some((brand, model)) => (brand, model),
            None => match name.split_once(' ') {
                Some((brand, model)) => (brand.to_string(), model.trim().to_string()),
                None => (name.to_string(), String::new()),
            },
        };

        extraction.assign(Field::Brand, &brand);
        if is_year(extra) {
            extraction.assign(Field::Year, extra);
            extraction.assign(Field::Model, &model);
        } else if model.is_empty() {
            extraction.assign(Field::Model, extra);
        } else if extra.is_empty() {
            extraction.assign(Field::Model, &model);
        } else {
            extraction.assign(Field::Model, &format!("{}, {}", model, extra));
        }
    }

    fn url_tier(&self, url: &Url, extraction: &mut Extraction) {
        if let Some((brand, model)) = detail_segments(url) {
            extraction.assign(Field::Brand, &brand);
            extraction.assign(Field::Model, &model);
        }
    }
}

/// Brand and model from `/detail/{brand}/{model}/...`, as display names
fn detail_segments(url: &Url) -> Option<(String, String)> {
    let mut segments = url.path_segments()?;
    segments.find(|s| *s == "detail")?;

    let brand = segments.next().filter(|s| !s.is_empty())?;
    let model = segments.next().filter(|s| !s.is_empty())?;
    Some((display_name(brand), display_name(model)))
}

/// Reads year and mileage from "Ojeté, 5/2014, 136 000 km"
fn read_subtitle(subtitle: &str, extraction: &mut Extraction) {
    let subtitle = subtitle.replace("Ojeté", "").replace("Nové", "");

    for part in subtitle.split(',').map(str::trim) {
        if let Some((_, year)) = part.split_once('/') {
            if is_year(year) {
                extraction.assign(Field::Year, year);
            }
        } else if is_year(part) {
            extraction.assign(Field::Year, part);
        }

        if part.to_lowercase().contains("km") {
            extraction.assign(Field::Mileage, part);
        }
    }
}

/// "land-rover" -> "Land Rover"
fn display_name(segment: &str) -> String {
    segment
        .split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
