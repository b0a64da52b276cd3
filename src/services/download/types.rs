//! Download service types and events.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::api::ApiError;
use crate::models::FailedDownload;

/// Events emitted during a batch run.
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    /// Letter fetched and written to disk
    Fetched { reference: String },
    /// File already present, no request made
    Skipped { reference: String },
    /// Item failed; the batch continues
    Failed { reference: String, error: String },
    /// Emitted exactly once per processed reference, success or failure
    Progress { completed: usize, total: usize },
}

/// Result of a batch run.
#[derive(Debug, Default)]
pub struct DownloadResult {
    /// References with a letter on disk after the run, in input order.
    pub successful: Vec<String>,
    /// References that failed, with the reason, in input order.
    pub failed: Vec<FailedDownload>,
    /// How many of `successful` were already on disk and not re-fetched.
    pub skipped: usize,
}

/// Configuration for the download service.
pub struct DownloadConfig {
    pub output_dir: PathBuf,
    /// Fixed delay between letter requests. Zero disables the wait.
    pub request_delay: Duration,
}

/// Batch-fatal failures. Item-local errors land in [`DownloadResult::failed`]
/// instead.
#[derive(Debug, Error)]
pub enum BatchError {
    /// No stored credentials; nothing was attempted.
    #[error("No credentials found")]
    NoCredentials,
    /// The once-per-batch token exchange failed; no items were processed.
    #[error("Failed to obtain access token")]
    Token(#[source] ApiError),
    /// The output directory could not be created.
    #[error("Failed to create output directory {}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
