//! Listing page discovery
//!
//! A listing page is scanned for anchors the site adapter recognises as
//! detail links. Relative hrefs are resolved against the site origin and the
//! result is deduplicated.

use crate::context::RunContext;
use crate::crawler::fetch_url;
use crate::sites::SiteAdapter;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Fetches listing page `page` and returns the detail URLs on it
///
/// A page that cannot be fetched yields an empty set, which the page budget
/// treats as the end of the listing.
pub async fn discover_page(
    ctx: &RunContext,
    adapter: &dyn SiteAdapter,
    base: &Url,
    page: u32,
) -> BTreeSet<String> {
    let page_url = adapter.page_url(base, page);
    tracing::debug!("Fetching listing page {}: {}", page, page_url);

    match fetch_url(&ctx.client, page_url.as_str(), &ctx.retry).await.into_body() {
        Some(body) => collect_listing_links(adapter, &body),
        None => {
            tracing::warn!("Listing page {} could not be fetched", page_url);
            BTreeSet::new()
        }
    }
}

/// Extracts the deduplicated absolute detail URLs from a listing page body
pub fn collect_listing_links(adapter: &dyn SiteAdapter, body: &str) -> BTreeSet<String> {
    let document = Html::parse_document(body);
    let mut links = BTreeSet::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if !adapter.is_listing_link(element, href) {
            continue;
        }
        if let Some(absolute) = resolve_link(href, adapter.origin()) {
            links.insert(absolute);
        }
    }

    links
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None for empty hrefs, fragment-only links, `javascript:`,
/// `mailto:`, `tel:` and `data:` links, and anything that does not resolve.
fn resolve_link(href: &str, origin: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match origin.join(href) {
        Ok(mut absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            absolute.set_fragment(None);
            Some(absolute.to_string())
        }
        _ => None,
    }
}
