// src/download/naming.rs
// =============================================================================
// Local file names for downloaded images.
//
// Two different URLs often share a basename ("/a/logo.png" and
// "/b/logo.png"), so the name is prefixed with part of a SHA-256 of the
// full URL:
//
//   https://example.com/a/logo.png -> 3f1c9a0b2d4e6f70-logo.png
//
// The same URL always maps to the same name.
// =============================================================================

use sha2::{Digest, Sha256};
use url::Url;

// Hex characters of the hash kept in the name (64 bits)
const HASH_PREFIX_LEN: usize = 16;

// Longest basename we keep after sanitizing
const MAX_BASENAME_LEN: usize = 64;

// Used when the URL has no usable last path segment
const FALLBACK_BASENAME: &str = "image";

pub fn local_file_name(url: &Url) -> String {
    let digest = Sha256::digest(url.as_str().as_bytes());
    let hash = format!("{:x}", digest);

    format!("{}-{}", &hash[..HASH_PREFIX_LEN], basename(url))
}

// Last path segment, reduced to characters that are safe on every
// filesystem we care about
fn basename(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    let cleaned: String = segment
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .take(MAX_BASENAME_LEN)
        .collect();

    // "." and ".." would point outside the file we meant to write
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        FALLBACK_BASENAME.to_string()
    } else {
        cleaned.to_string()
    }
}
