//! Referral letter download service.
//!
//! The batch orchestrator: authenticates once, then walks the reference list
//! strictly sequentially, skipping letters already on disk and capturing
//! per-item failures without halting the batch. Separated from UI concerns -
//! emits events for progress tracking.

mod types;

pub use types::{BatchError, DownloadConfig, DownloadEvent, DownloadResult};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::api::{ApiError, OceanClient};
use crate::config::Credentials;
use crate::models::{letter_path, validate_reference, FailedDownload, InvalidReference};

/// Outcome of one successfully handled reference.
enum Outcome {
    Fetched,
    Skipped,
}

/// Item-local failures. None of these stop the batch.
#[derive(Debug, Error)]
enum ItemError {
    #[error(transparent)]
    Invalid(#[from] InvalidReference),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Failed to write letter: {0}")]
    Write(std::io::Error),
}

/// Service for downloading referral letters in a batch.
pub struct DownloadService {
    client: OceanClient,
    config: DownloadConfig,
}

impl DownloadService {
    /// Create a new download service.
    pub fn new(client: OceanClient, config: DownloadConfig) -> Self {
        Self { client, config }
    }

    /// Run one batch over `references` in input order.
    ///
    /// Exchanges credentials for a token at most once, then processes every
    /// reference sequentially, sleeping `request_delay` between items (never
    /// after the last). Emits one `Progress` event per reference, success or
    /// failure. Batch-fatal conditions return `Err` with no partial results;
    /// per-item failures are captured in the result and the loop continues.
    pub async fn run(
        &self,
        credentials: Option<Credentials>,
        references: &[String],
        event_tx: mpsc::Sender<DownloadEvent>,
    ) -> Result<DownloadResult, BatchError> {
        let credentials = credentials.ok_or(BatchError::NoCredentials)?;

        let token = self
            .client
            .fetch_access_token(&credentials)
            .await
            .map_err(BatchError::Token)?;

        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|source| BatchError::OutputDir {
                path: self.config.output_dir.clone(),
                source,
            })?;

        let total = references.len();
        let mut result = DownloadResult::default();

        for (index, reference) in references.iter().enumerate() {
            match self.download_letter(&token, reference).await {
                Ok(Outcome::Fetched) => {
                    result.successful.push(reference.clone());
                    let _ = event_tx
                        .send(DownloadEvent::Fetched {
                            reference: reference.clone(),
                        })
                        .await;
                }
                Ok(Outcome::Skipped) => {
                    result.successful.push(reference.clone());
                    result.skipped += 1;
                    let _ = event_tx
                        .send(DownloadEvent::Skipped {
                            reference: reference.clone(),
                        })
                        .await;
                }
                Err(e) => {
                    let error = e.to_string();
                    tracing::warn!("download failed for {}: {}", reference, error);
                    result.failed.push(FailedDownload {
                        reference: reference.clone(),
                        error: error.clone(),
                    });
                    let _ = event_tx
                        .send(DownloadEvent::Failed {
                            reference: reference.clone(),
                            error,
                        })
                        .await;
                }
            }

            let _ = event_tx
                .send(DownloadEvent::Progress {
                    completed: index + 1,
                    total,
                })
                .await;

            // Fixed flow-control delay between items, never after the last.
            if index + 1 < total && !self.config.request_delay.is_zero() {
                tokio::time::sleep(self.config.request_delay).await;
            }
        }

        Ok(result)
    }

    /// Handle a single reference.
    ///
    /// The exists-check runs before shape validation, so a letter already on
    /// disk never triggers a request regardless of its reference. The file
    /// write happens only after a fully successful fetch, so a failed fetch
    /// leaves no partial file behind.
    async fn download_letter(&self, token: &str, reference: &str) -> Result<Outcome, ItemError> {
        let path = letter_path(&self.config.output_dir, reference);

        if path.exists() {
            tracing::info!("letter already present, skipping: {}", path.display());
            return Ok(Outcome::Skipped);
        }

        validate_reference(reference)?;

        let bytes = self.client.fetch_letter(token, reference).await?;

        tokio::fs::write(&path, &bytes)
            .await
            .map_err(ItemError::Write)?;

        tracing::info!("wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(Outcome::Fetched)
    }
}
