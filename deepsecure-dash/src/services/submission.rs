//! Submission orchestration
//!
//! Drives one record from `queued` to its terminal status: stage updates,
//! the detection request, and the final resolve. Every failure becomes an
//! inconclusive record; the typed error is only logged.

use deepsecure_common::events::{RecordId, RecordStatus, RequestStage};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::models::{Detection, DetectionOutcome, RecordError};
use crate::services::detection_client::{endpoint_for, DetectionClient, SubmissionError};
use crate::services::intake::MediaFile;
use crate::services::record_store::RecordStore;

/// Runs detection requests against records in the store
#[derive(Clone)]
pub struct Submitter {
    records: RecordStore,
    client: Arc<DetectionClient>,
    last_error: Arc<RwLock<Option<String>>>,
}

impl Submitter {
    pub fn new(
        records: RecordStore,
        client: Arc<DetectionClient>,
        last_error: Arc<RwLock<Option<String>>>,
    ) -> Self {
        Self {
            records,
            client,
            last_error,
        }
    }

    /// Start the submission on its own task
    pub fn spawn(&self, id: RecordId, file: MediaFile) -> JoinHandle<Option<RecordStatus>> {
        let submitter = self.clone();
        tokio::spawn(async move { submitter.run(id, file).await })
    }

    /// Run one submission to completion
    ///
    /// Returns the terminal status, or `None` when the record was removed
    /// before the outcome could be applied.
    pub async fn run(&self, id: RecordId, file: MediaFile) -> Option<RecordStatus> {
        let outcome = match self.request(id, &file).await {
            Ok(Some(detection)) => DetectionOutcome::Detected(detection),
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(record_id = %id, name = %file.name, error = %e, "Detection failed");
                *self.last_error.write().await = Some(e.to_string());
                DetectionOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        match self.records.resolve(id, outcome).await {
            Ok(status) => {
                tracing::info!(record_id = %id, name = %file.name, status = status.as_str(), "Record resolved");
                Some(status)
            }
            Err(RecordError::NotFound(_)) => {
                tracing::debug!(record_id = %id, "Discarding result for removed record");
                None
            }
            Err(e) => {
                tracing::warn!(record_id = %id, error = %e, "Could not apply detection result");
                None
            }
        }
    }

    /// `Ok(None)` means the record disappeared before the upload started
    async fn request(
        &self,
        id: RecordId,
        file: &MediaFile,
    ) -> Result<Option<Detection>, SubmissionError> {
        // Unsupported types resolve straight away without touching the network
        endpoint_for(&file.mime_type)?;

        if !self.mark(id, RequestStage::Uploading).await {
            return Ok(None);
        }
        let pending = self.client.send(file).await?;

        // A removal during the upload is handled when resolving
        self.mark(id, RequestStage::AwaitingResponse).await;
        let detection = pending.detection().await?;
        Ok(Some(detection))
    }

    async fn mark(&self, id: RecordId, stage: RequestStage) -> bool {
        match self.records.advance(id, stage).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(record_id = %id, stage = ?stage, error = %e, "Stage update skipped");
                false
            }
        }
    }
}
