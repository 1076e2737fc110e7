// src/error.rs
// =============================================================================
// Typed failures for the scrape-and-download pipeline.
//
// Two families:
// - FetchError: why a page could not be scraped at all ("stop processing
//   this page"). The front-ends turn it into a message or an empty list.
// - DownloadError: why one image failed. It never escapes the dispatcher;
//   it is folded into that image's DownloadOutcome instead.
//
// Rust concepts:
// - thiserror: derives std::error::Error and Display from attributes
// - #[from]/#[source]: keep the underlying reqwest/io error for context
// =============================================================================

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Why a page produced nothing to scrape
#[derive(Debug, Error)]
pub enum FetchError {
    /// The caller supplied no URL (empty or whitespace only)
    #[error("no url supplied")]
    EmptyUrl,

    /// The URL failed the well-formed check (not http/https, no host, ...)
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Network failure before a response arrived (DNS, connect, timeout)
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The server answered with something other than 2xx
    #[error("unexpected status {0}")]
    Status(StatusCode),

    /// The response started fine but the body could not be read
    #[error("failed to read page body: {0}")]
    Body(#[source] reqwest::Error),

    /// The final (post-redirect) URL has no host to resolve against
    #[error("final url '{0}' has no host")]
    NoHost(String),
}

// Why a single image download failed
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("failed while reading body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("could not create output directory: {0}")]
    CreateDir(#[source] std::io::Error),

    #[error("could not write file: {0}")]
    Write(#[from] std::io::Error),

    #[error("cancelled")]
    Cancelled,

    /// The worker that owned this URL died before reporting
    #[error("worker stopped before reporting")]
    WorkerLost,
}

// Compact, serializable tag for a DownloadError
//
// The full error (with its source chain) is not Serialize, so outcomes
// carry this tag plus the rendered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Network,
    HttpStatus,
    Write,
    Cancelled,
    WorkerLost,
}

impl DownloadError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DownloadError::Timeout => FailureKind::Timeout,
            DownloadError::Request(_) | DownloadError::Body(_) => FailureKind::Network,
            DownloadError::Status(_) => FailureKind::HttpStatus,
            DownloadError::CreateDir(_) | DownloadError::Write(_) => FailureKind::Write,
            DownloadError::Cancelled => FailureKind::Cancelled,
            DownloadError::WorkerLost => FailureKind::WorkerLost,
        }
    }

    // reqwest reports timeouts as ordinary errors; pull them out so the
    // outcome says "timeout" rather than a generic network failure
    pub fn from_request(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            DownloadError::Timeout
        } else {
            DownloadError::Request(error)
        }
    }

    pub fn from_body(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            DownloadError::Timeout
        } else {
            DownloadError::Body(error)
        }
    }
}
