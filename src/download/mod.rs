// src/download/mod.rs
// =============================================================================
// This module downloads images to disk.
//
// Submodules:
// - dispatcher: the worker pool that fetches every URL
// - naming: deterministic, collision-free local file names
//
// This file holds the result types the rest of the app looks at:
// one DownloadOutcome per URL, plus a small summary for printing.
// =============================================================================

mod dispatcher;
mod naming;

pub use dispatcher::DownloadDispatcher;

use crate::error::{DownloadError, FailureKind};
use serde::Serialize;
use std::path::PathBuf;

// What happened to one URL
#[derive(Debug, Clone, Serialize)]
pub struct DownloadOutcome {
    /// Position of the URL in the list handed to the dispatcher
    pub index: usize,
    pub url: String,
    #[serde(flatten)]
    pub status: DownloadStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadStatus {
    Success { local_path: PathBuf, bytes: u64 },
    Failed { kind: FailureKind, reason: String },
}

impl DownloadOutcome {
    pub fn success(index: usize, url: impl Into<String>, local_path: PathBuf, bytes: u64) -> Self {
        Self {
            index,
            url: url.into(),
            status: DownloadStatus::Success { local_path, bytes },
        }
    }

    pub fn failed(index: usize, url: impl Into<String>, error: &DownloadError) -> Self {
        Self {
            index,
            url: url.into(),
            status: DownloadStatus::Failed {
                kind: error.kind(),
                reason: error.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, DownloadStatus::Success { .. })
    }
}

// Outcomes arrive in completion order; this restores input order
pub fn sort_by_index(outcomes: &mut [DownloadOutcome]) {
    outcomes.sort_by_key(|outcome| outcome.index);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DownloadSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
}

impl DownloadSummary {
    pub fn from_outcomes(outcomes: &[DownloadOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            succeeded,
            failed: outcomes.len() - succeeded,
            total: outcomes.len(),
        }
    }
}
