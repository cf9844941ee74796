//! Server-Sent Events for record updates

use crate::AppState;
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use deepsecure_common::events::RecordId;
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// GET /events query
#[derive(Debug, Deserialize)]
pub struct EventQuery {
    /// Only forward events for this record
    #[serde(default)]
    pub record: Option<RecordId>,
}

/// GET /events - SSE stream of dashboard events
///
/// Streams RecordAdded, RecordStageChanged, RecordResolved, RecordRemoved,
/// RecordsCleared and ClaimAnalyzed. With `?record=<id>` only events for
/// that record are sent.
pub async fn event_stream(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(record = ?query.record, "New SSE client connected");

    let mut rx = state.event_bus.subscribe();
    let filter = query.record;

    let stream = async_stream::stream! {
        loop {
            tokio::select! {
                // Heartbeat every 15 seconds
                _ = tokio::time::sleep(Duration::from_secs(15)) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                received = rx.recv() => {
                    let event = match received {
                        Ok(event) => event,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "SSE: Client lagged, events dropped");
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    };

                    if let Some(wanted) = filter {
                        if event.record_id() != Some(wanted) {
                            continue;
                        }
                    }

                    let event_type = event.event_type();
                    match serde_json::to_string(&event) {
                        Ok(event_json) => {
                            debug!("SSE: Broadcasting event: {}", event_type);
                            yield Ok(Event::default().event(event_type).data(event_json));
                        }
                        Err(e) => {
                            warn!("SSE: Failed to serialize event {}: {}", event_type, e);
                        }
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
