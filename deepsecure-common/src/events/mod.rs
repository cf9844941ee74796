//! Event types for the DeepSecure event system
//!
//! Provides the shared event enum and the broadcast `EventBus` that feeds the
//! dashboard's SSE stream.

mod record_types;

pub use record_types::{MediaCategory, RecordId, RecordStatus, RequestStage};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Dashboard event types
///
/// Events are broadcast via `EventBus` and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DashEvent {
    /// A record was created by intake
    RecordAdded {
        record_id: RecordId,
        name: String,
        category: Option<MediaCategory>,
        timestamp: DateTime<Utc>,
    },

    /// A record's detection request moved to a new stage
    RecordStageChanged {
        record_id: RecordId,
        stage: RequestStage,
        timestamp: DateTime<Utc>,
    },

    /// A record reached its terminal status
    RecordResolved {
        record_id: RecordId,
        status: RecordStatus,
        /// Confidence reported by the detection service (absent on error)
        confidence: Option<f64>,
        /// Error message for inconclusive records
        error: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// A record was removed and its preview released
    RecordRemoved {
        record_id: RecordId,
        timestamp: DateTime<Utc>,
    },

    /// All records were removed
    RecordsCleared {
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A claim-verification request finished
    ClaimAnalyzed {
        verdict: String,
        confidence: f64,
        failed: bool,
        timestamp: DateTime<Utc>,
    },
}

impl DashEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            DashEvent::RecordAdded { .. } => "RecordAdded",
            DashEvent::RecordStageChanged { .. } => "RecordStageChanged",
            DashEvent::RecordResolved { .. } => "RecordResolved",
            DashEvent::RecordRemoved { .. } => "RecordRemoved",
            DashEvent::RecordsCleared { .. } => "RecordsCleared",
            DashEvent::ClaimAnalyzed { .. } => "ClaimAnalyzed",
        }
    }

    /// Record the event refers to, if any
    pub fn record_id(&self) -> Option<RecordId> {
        match self {
            DashEvent::RecordAdded { record_id, .. }
            | DashEvent::RecordStageChanged { record_id, .. }
            | DashEvent::RecordResolved { record_id, .. }
            | DashEvent::RecordRemoved { record_id, .. } => Some(*record_id),
            DashEvent::RecordsCleared { .. } | DashEvent::ClaimAnalyzed { .. } => None,
        }
    }
}

/// Broadcast bus for dashboard events
///
/// Cloning is cheap; all clones share one channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DashEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per slow subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<DashEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: DashEvent,
    ) -> Result<usize, broadcast::error::SendError<DashEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: DashEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let id = RecordId::new();
        let event = DashEvent::RecordStageChanged {
            record_id: id,
            stage: RequestStage::AwaitingResponse,
            timestamp: Utc::now(),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "RecordStageChanged");
        assert_eq!(value["stage"], "awaiting_response");
        assert_eq!(value["record_id"], id.to_string());
        assert_eq!(event.event_type(), "RecordStageChanged");
        assert_eq!(event.record_id(), Some(id));
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(10);
        let result = bus.emit(DashEvent::RecordsCleared {
            count: 0,
            timestamp: Utc::now(),
        });
        assert!(result.is_err());
        assert_eq!(bus.capacity(), 10);
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let id = RecordId::new();
        bus.emit_lossy(DashEvent::RecordAdded {
            record_id: id,
            name: "clip.mp4".to_string(),
            category: Some(MediaCategory::Video),
            timestamp: Utc::now(),
        });
        bus.emit_lossy(DashEvent::RecordRemoved {
            record_id: id,
            timestamp: Utc::now(),
        });

        assert_eq!(rx.recv().await.unwrap().event_type(), "RecordAdded");
        assert_eq!(rx.recv().await.unwrap().event_type(), "RecordRemoved");
    }
}
