// src/scrape/resolve.rs
// =============================================================================
// This module turns raw image references into absolute URLs.
//
// Rules, first match wins:
//   "https://cdn.example.com/a.png" -> used as is
//   "//cdn.example.com/a.png"       -> origin scheme + ref
//   "/img/a.png"                    -> origin + ref
//   "img/a.png"                     -> origin + "/" + ref
//
// Relative refs are joined to the origin ROOT, not to the page's own
// directory: only the origin survives the fetch step.
//
// A backslash in the leading slashes counts as "/" ("\\cdn.example.com\a.png"
// is scheme-relative), the same way browsers read http(s) URLs.
//
// Dropped: empty refs, data: URIs, anything that doesn't end up as an
// http(s) URL with a host (javascript:, mailto:, garbage).
// =============================================================================

use super::fetch::Origin;
use std::collections::HashSet;
use url::Url;

// Resolves one raw reference against the page origin
//
// Returns: Some(absolute_url) or None if the ref should be dropped
pub fn resolve_image_ref(origin: &Origin, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || is_data_uri(raw) {
        return None;
    }

    let url = match Url::parse(raw) {
        Ok(url) if url.has_host() => url,
        // Has a scheme but no host ("javascript:void(0)", "mailto:...")
        Ok(_) => return None,
        Err(_) => Url::parse(&absolutize(origin, raw)).ok()?,
    };

    if is_fetchable(&url) {
        Some(url)
    } else {
        None
    }
}

// Resolves every reference, dropping failures and repeats
//
// The first occurrence of each URL keeps its place, so the result is still
// in document order.
pub fn resolve_all<I, S>(origin: &Origin, raw_refs: I) -> Vec<Url>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();

    raw_refs
        .into_iter()
        .filter_map(|raw| resolve_image_ref(origin, raw.as_ref()))
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}

fn absolutize(origin: &Origin, raw: &str) -> String {
    let mut leading = raw.chars();
    match (leading.next(), leading.next()) {
        (Some(a), Some(b)) if is_slash(a) && is_slash(b) => format!("{}:{}", origin.scheme(), raw),
        (Some(a), _) if is_slash(a) => format!("{}{}", origin, raw),
        _ => format!("{}/{}", origin, raw),
    }
}

// Url::parse turns the remaining backslashes of an http(s) URL into "/"
fn is_slash(c: char) -> bool {
    c == '/' || c == '\\'
}

fn is_data_uri(raw: &str) -> bool {
    raw.get(..5)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("data:"))
}

fn is_fetchable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host_str().map_or(false, |h| !h.is_empty())
}
