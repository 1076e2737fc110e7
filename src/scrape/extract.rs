// src/scrape/extract.rs
// =============================================================================
// This module finds image references in an HTML page.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever, whose tokenizer recovers from broken markup the
//   way browsers do (unclosed tags, stray '<', truncated attributes...)
//
// What we collect, in document order:
// - <img src="...">
// - <img data-src="...">       (common lazy-loading convention)
// - <img srcset="...">         (every candidate URL, descriptors removed)
// - <source srcset="...">      (inside <picture>)
//
// References are returned verbatim. Resolving and filtering happen in
// resolve.rs; nothing here can fail.
// =============================================================================

use scraper::{Html, Selector};

// Extracts raw image references from an HTML body
//
// Parameters:
//   body: the page bytes (need not be valid UTF-8, or even HTML)
//
// Returns: every reference found, in document order, duplicates included
//
// Example:
//   body = r#"<img src="/a.png" srcset="a-1x.png 1x, a-2x.png 2x">"#
//   result = ["/a.png", "a-1x.png", "a-2x.png"]
pub fn extract_image_refs(body: &[u8]) -> Vec<String> {
    // Invalid UTF-8 becomes U+FFFD instead of an error
    let html = String::from_utf8_lossy(body);
    if html.trim().is_empty() {
        return Vec::new();
    }

    let document = Html::parse_document(&html);

    // Constant selector, known to be valid
    let selector = Selector::parse("img, source").unwrap();

    let mut refs = Vec::new();

    for element in document.select(&selector) {
        let element = element.value();

        if element.name() == "img" {
            if let Some(src) = element.attr("src") {
                refs.push(src.to_string());
            }
            if let Some(lazy) = element.attr("data-src") {
                refs.push(lazy.to_string());
            }
        }

        if let Some(srcset) = element.attr("srcset") {
            refs.extend(SrcsetCandidates::new(srcset).map(str::to_string));
        }
    }

    refs
}

// Iterator over the URLs in a srcset attribute
//
// "a.png 1x, b.png 2x" yields "a.png" then "b.png". A URL runs until
// whitespace, so commas inside it (data: URIs) are kept; a trailing comma
// ends the candidate.
pub struct SrcsetCandidates<'a> {
    rest: &'a str,
}

impl<'a> SrcsetCandidates<'a> {
    pub fn new(srcset: &'a str) -> Self {
        Self { rest: srcset }
    }
}

impl<'a> Iterator for SrcsetCandidates<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            let rest = self
                .rest
                .trim_start_matches(|c: char| c.is_whitespace() || c == ',');
            if rest.is_empty() {
                self.rest = rest;
                return None;
            }

            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let (token, after) = rest.split_at(end);

            if token.ends_with(',') {
                // "a.png, b.png 2x": the comma ends "a.png", no descriptor
                self.rest = after;
            } else {
                // Skip "2x" / "640w" up to the next candidate
                self.rest = match after.find(',') {
                    Some(comma) => &after[comma + 1..],
                    None => "",
                };
            }

            let url = token.trim_end_matches(',');
            if !url.is_empty() {
                return Some(url);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_img_src() {
        let refs = extract_image_refs(br#"<p><img src="https://cdn.example.com/a.png"></p>"#);
        assert_eq!(refs, vec!["https://cdn.example.com/a.png"]);
    }

    #[test]
    fn test_document_order_and_duplicates() {
        let html = br#"
            <img src="/one.png">
            <div><img src="two.jpg"></div>
            <img src="/one.png">
        "#;
        assert_eq!(
            extract_image_refs(html),
            vec!["/one.png", "two.jpg", "/one.png"]
        );
    }

    #[test]
    fn test_srcset_and_picture_sources() {
        let html = br#"
            <picture>
              <source srcset="/hero.webp 1x, /hero@2x.webp 2x" type="image/webp">
              <img src="/hero.jpg" srcset="/hero-640.jpg 640w,/hero-1280.jpg 1280w">
            </picture>
            <img data-src="/lazy.png" src="/placeholder.gif">
        "#;
        assert_eq!(
            extract_image_refs(html),
            vec![
                "/hero.webp",
                "/hero@2x.webp",
                "/hero.jpg",
                "/hero-640.jpg",
                "/hero-1280.jpg",
                "/placeholder.gif",
                "/lazy.png",
            ]
        );
    }

    #[test]
    fn test_srcset_keeps_commas_inside_urls() {
        let candidates: Vec<_> =
            SrcsetCandidates::new("data:image/png;base64,iVBO 1x, b.png 2x").collect();
        assert_eq!(candidates, vec!["data:image/png;base64,iVBO", "b.png"]);
    }

    #[test]
    fn test_srcset_url_runs_until_whitespace() {
        // No space after the comma, so it belongs to the URL
        let candidates: Vec<_> = SrcsetCandidates::new("a.png,b.png 2x").collect();
        assert_eq!(candidates, vec!["a.png,b.png"]);
    }

    #[test]
    fn test_srcset_without_descriptors() {
        let candidates: Vec<_> = SrcsetCandidates::new(" a.png, b.png ,, c.png").collect();
        assert_eq!(candidates, vec!["a.png", "b.png", "c.png"]);
        assert_eq!(SrcsetCandidates::new("  ,  ").count(), 0);
    }

    #[test]
    fn test_empty_and_non_html_input() {
        assert!(extract_image_refs(b"").is_empty());
        assert!(extract_image_refs(b"   \n\t").is_empty());
        assert!(extract_image_refs(b"{\"json\": true}").is_empty());
    }

    #[test]
    fn test_malformed_markup_recovers() {
        let html = br#"<div><img src="/a.png"><span><<img src=/b.png><img src="/c.pn"#;
        let refs = extract_image_refs(html);
        // The truncated last tag is lost; everything before it survives
        assert_eq!(refs.first().map(String::as_str), Some("/a.png"));
        assert!(refs.iter().any(|r| r == "/b.png"));
    }

    #[test]
    fn test_binary_garbage_does_not_panic() {
        let garbage: Vec<u8> = (0..4096u32).map(|i| (i * 31 % 256) as u8).collect();
        let _ = extract_image_refs(&garbage);

        let mut mixed = b"<img src=\"/ok.png\">".to_vec();
        mixed.extend_from_slice(&[0xff, 0xfe, 0x00, b'<', b'i', b'm', b'g']);
        assert_eq!(extract_image_refs(&mixed), vec!["/ok.png"]);
    }
}
