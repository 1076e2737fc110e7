// src/scrape/fetch.rs
// =============================================================================
// This module fetches the page we are going to scrape.
//
// Key functionality:
// - Checks that the input looks like a real http(s) URL before any I/O
// - Makes exactly one GET request (redirects are followed by reqwest)
// - Records the origin (scheme + host) of the FINAL url, so a redirected
//   page is scraped against the host that actually served it
// - Reads the whole body before returning, so the connection goes back to
//   the pool whether the fetch worked or not
//
// Rust concepts:
// - Result<T, E> with a typed error enum instead of "empty string + None"
// - Option: an Origin only exists for URLs that have a host
// - Display: lets us print an Origin with {}
// =============================================================================

use crate::config::FetchConfig;
use crate::error::FetchError;
use reqwest::Client;
use std::fmt;
use tracing::debug;
use url::Url;

// Scheme + host (with port, if any) of the page that was actually served
//
// Example: "https://example.com:8443"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    scheme: String,
    host: String,
}

impl Origin {
    // Returns None for URLs that have no host (mailto:, data:, ...)
    pub fn from_url(url: &Url) -> Option<Origin> {
        let host = url.host_str()?;
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Some(Origin {
            scheme: url.scheme().to_string(),
            host,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme(), self.host())
    }
}

// A successfully fetched page
//
// Only ever built from a 2xx response, so `origin` is always meaningful.
#[derive(Debug, Clone)]
pub struct PageResult {
    pub origin: Origin,
    pub body: Vec<u8>,
}

// Builds the HTTP client shared by page fetches
//
// The timeout covers the whole exchange, body included.
pub fn build_client(config: &FetchConfig) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
}

// The "is this a well-formed URL" check the front-ends rely on
pub fn is_well_formed_url(input: &str) -> bool {
    parse_page_url(input).is_ok()
}

// Parses user input into a page URL
//
// Accepts only absolute http/https URLs with a host.
// Surrounding whitespace (e.g. a trailing newline from stdin) is ignored.
pub fn parse_page_url(input: &str) -> Result<Url, FetchError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FetchError::EmptyUrl);
    }

    let invalid = |reason: String| FetchError::InvalidUrl {
        url: trimmed.to_string(),
        reason,
    };

    let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    Ok(url)
}

// Fetches a page and returns its origin and body
//
// Parameters:
//   client: shared reqwest client (carries the timeout)
//   url: an already-validated page URL
//
// Returns: PageResult on a 2xx response, FetchError otherwise
pub async fn fetch_page(client: &Client, url: &Url) -> Result<PageResult, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(FetchError::Request)?;

    // response.url() is where we ended up after redirects
    let final_url = response.url().clone();
    let status = response.status();

    if !status.is_success() {
        // Drain the error body so the connection can be reused
        let _ = response.bytes().await;
        return Err(FetchError::Status(status));
    }

    let origin = match Origin::from_url(&final_url) {
        Some(origin) => origin,
        None => {
            let _ = response.bytes().await;
            return Err(FetchError::NoHost(final_url.to_string()));
        }
    };

    let body = response.bytes().await.map_err(FetchError::Body)?;

    debug!(
        url = %url,
        final_url = %final_url,
        bytes = body.len(),
        "fetched page"
    );

    Ok(PageResult {
        origin,
        body: body.to_vec(),
    })
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not return (String, Option<body>)?
//    - An empty string plus None can't say WHY nothing came back
//    - FetchError tells the caller: no URL, bad URL, network, or status
//    - The caller still decides how loud to be about it
//
// 2. What does response.url() give us?
//    - reqwest follows redirects for us (up to the policy limit)
//    - response.url() is the last URL in that chain
//    - That's the host relative image paths belong to
//
// 3. Why call .bytes() even on errors?
//    - A response whose body was never read can't be put back in the
//      connection pool; reading it to the end lets reqwest reuse it
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client() -> Client {
        build_client(&FetchConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_page_url_accepts_http() {
        let url = parse_page_url("  https://example.com/gallery \n").unwrap();
        assert_eq!(url.as_str(), "https://example.com/gallery");
    }

    #[test]
    fn test_parse_page_url_rejects_empty() {
        assert!(matches!(parse_page_url("   "), Err(FetchError::EmptyUrl)));
    }

    #[test]
    fn test_parse_page_url_rejects_bad_input() {
        assert!(matches!(
            parse_page_url("not a url"),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_page_url("ftp://example.com/file"),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(!is_well_formed_url("mailto:someone@example.com"));
        assert!(is_well_formed_url("http://localhost:8080/"));
    }

    #[test]
    fn test_origin_keeps_port() {
        let url = Url::parse("http://127.0.0.1:8080/a/b?c=d").unwrap();
        let origin = Origin::from_url(&url).unwrap();
        assert_eq!(origin.scheme(), "http");
        assert_eq!(origin.host(), "127.0.0.1:8080");
        assert_eq!(origin.to_string(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_origin_drops_default_port() {
        let url = Url::parse("https://example.com:443/page").unwrap();
        assert_eq!(Origin::from_url(&url).unwrap().to_string(), "https://example.com");
    }

    #[tokio::test]
    async fn test_fetch_page_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gallery"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<img src=\"/a.png\">"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/gallery", server.uri())).unwrap();
        let page = fetch_page(&test_client(), &url).await.unwrap();

        assert_eq!(page.origin.to_string(), server.uri());
        assert_eq!(page.body, b"<img src=\"/a.png\">");
    }

    #[tokio::test]
    async fn test_fetch_page_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let result = fetch_page(&test_client(), &url).await;

        assert!(matches!(result, Err(FetchError::Status(s)) if s.as_u16() == 404));
    }

    #[tokio::test]
    async fn test_fetch_page_uses_redirected_origin() {
        let landing = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&landing)
            .await;

        let entry = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("Location", format!("{}/new", landing.uri()).as_str()),
            )
            .mount(&entry)
            .await;

        let url = Url::parse(&format!("{}/old", entry.uri())).unwrap();
        let page = fetch_page(&test_client(), &url).await.unwrap();

        assert_eq!(page.origin.to_string(), landing.uri());
    }

    #[tokio::test]
    async fn test_fetch_page_connection_refused() {
        // Port 1 is essentially never listening
        let url = Url::parse("http://127.0.0.1:1/").unwrap();
        let result = fetch_page(&test_client(), &url).await;
        assert!(matches!(result, Err(FetchError::Request(_))));
    }
}
