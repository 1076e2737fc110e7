// src/scrape/mod.rs
// =============================================================================
// This module turns a page URL into the list of images on that page.
//
// Submodules:
// - fetch: validates the URL and GETs the page (origin + body)
// - extract: pulls raw image references out of the HTML
// - resolve: makes those references absolute and drops the bad ones
//
// Everything here runs sequentially per page; the only concurrent work in
// the crate is downloading, in src/download/.
// =============================================================================

mod extract;
mod fetch;
mod resolve;

pub use fetch::{build_client, is_well_formed_url};

use crate::error::FetchError;
use extract::extract_image_refs;
use fetch::{fetch_page, parse_page_url};
use resolve::resolve_all;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

// Fetches a page and returns the absolute URLs of its images
//
// Ok(vec![]) means the page loaded but had no usable images.
// Err says why the page itself couldn't be used (no URL, bad URL, network,
// status...).
pub async fn scrape_image_urls(client: &Client, page_url: &str) -> Result<Vec<Url>, FetchError> {
    let url = parse_page_url(page_url)?;
    let page = fetch_page(client, &url).await?;

    let raw_refs = extract_image_refs(&page.body);
    debug!(count = raw_refs.len(), "extracted raw image references");

    let images = resolve_all(&page.origin, &raw_refs);

    info!(
        url = %url,
        origin = %page.origin,
        found = raw_refs.len(),
        resolved = images.len(),
        "scraped page"
    );

    Ok(images)
}
