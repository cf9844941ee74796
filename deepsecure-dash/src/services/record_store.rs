//! In-memory record list
//!
//! Records keep insertion order and are addressed only by `RecordId`. Each
//! entry owns its preview handle, so dropping an entry releases the preview.

use chrono::Utc;
use deepsecure_common::events::{DashEvent, EventBus, RecordId, RecordStatus, RequestStage};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{DetectionOutcome, RecordError, UploadedFile};
use crate::services::preview_store::PreviewHandle;

struct Entry {
    record: UploadedFile,
    // Held only for its Drop
    _preview: Option<PreviewHandle>,
}

/// Shared list of uploaded-file records
#[derive(Clone)]
pub struct RecordStore {
    entries: Arc<RwLock<Vec<Entry>>>,
    event_bus: EventBus,
}

impl RecordStore {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            event_bus,
        }
    }

    /// Append a record, taking ownership of its preview
    pub async fn insert(&self, mut record: UploadedFile, preview: Option<PreviewHandle>) -> RecordId {
        record.preview = preview.as_ref().map(PreviewHandle::url);
        let id = record.id;
        let name = record.name.clone();
        let category = record.category;

        self.entries.write().await.push(Entry {
            record,
            _preview: preview,
        });

        tracing::debug!(record_id = %id, name = %name, "Record added");
        self.event_bus.emit_lossy(DashEvent::RecordAdded {
            record_id: id,
            name,
            category,
            timestamp: Utc::now(),
        });
        id
    }

    /// Snapshot of all records in insertion order
    pub async fn list(&self) -> Vec<UploadedFile> {
        self.entries
            .read()
            .await
            .iter()
            .map(|entry| entry.record.clone())
            .collect()
    }

    pub async fn get(&self, id: RecordId) -> Option<UploadedFile> {
        self.entries
            .read()
            .await
            .iter()
            .find(|entry| entry.record.id == id)
            .map(|entry| entry.record.clone())
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Move a record's request to a later stage
    pub async fn advance(&self, id: RecordId, stage: RequestStage) -> Result<(), RecordError> {
        {
            let mut entries = self.entries.write().await;
            let entry = find_mut(&mut entries, id)?;
            entry.record.advance(stage)?;
        }

        self.event_bus.emit_lossy(DashEvent::RecordStageChanged {
            record_id: id,
            stage,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Apply the terminal outcome to a record
    pub async fn resolve(
        &self,
        id: RecordId,
        outcome: DetectionOutcome,
    ) -> Result<RecordStatus, RecordError> {
        let (status, confidence, error) = {
            let mut entries = self.entries.write().await;
            let entry = find_mut(&mut entries, id)?;
            let status = entry.record.resolve(outcome)?;
            (status, entry.record.confidence, entry.record.error.clone())
        };

        self.event_bus.emit_lossy(DashEvent::RecordResolved {
            record_id: id,
            status,
            confidence,
            error,
            timestamp: Utc::now(),
        });
        Ok(status)
    }

    /// Remove a record and release its preview
    pub async fn remove(&self, id: RecordId) -> Result<UploadedFile, RecordError> {
        let entry = {
            let mut entries = self.entries.write().await;
            let position = entries
                .iter()
                .position(|entry| entry.record.id == id)
                .ok_or(RecordError::NotFound(id))?;
            entries.remove(position)
        };

        let Entry { record, _preview } = entry;
        drop(_preview);

        tracing::info!(record_id = %id, name = %record.name, "Record removed");
        self.event_bus.emit_lossy(DashEvent::RecordRemoved {
            record_id: id,
            timestamp: Utc::now(),
        });
        Ok(record)
    }

    /// Remove every record, releasing all previews
    pub async fn clear(&self) -> usize {
        let drained: Vec<Entry> = {
            let mut entries = self.entries.write().await;
            entries.drain(..).collect()
        };
        let count = drained.len();
        drop(drained);

        tracing::info!(count, "All records cleared");
        self.event_bus.emit_lossy(DashEvent::RecordsCleared {
            count,
            timestamp: Utc::now(),
        });
        count
    }
}

fn find_mut(entries: &mut [Entry], id: RecordId) -> Result<&mut Entry, RecordError> {
    entries
        .iter_mut()
        .find(|entry| entry.record.id == id)
        .ok_or(RecordError::NotFound(id))
}
