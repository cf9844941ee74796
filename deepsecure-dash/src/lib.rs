//! deepsecure-dash library interface
//!
//! Exposes the router and services for the binary and for integration tests.

pub mod api;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use deepsecure_common::config::ServiceConfig;
use deepsecure_common::events::EventBus;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::services::{
    ClaimClient, DetectionClient, PreviewStore, RecordStore, SampleCatalog, Submitter,
};

/// Largest accepted request body (uploads are buffered in memory)
pub const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub records: RecordStore,
    pub previews: PreviewStore,
    pub submitter: Submitter,
    pub claims: Arc<ClaimClient>,
    pub samples: Arc<SampleCatalog>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Most recent submission or claim failure
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(config: &ServiceConfig) -> deepsecure_common::Result<Self> {
        let event_bus = EventBus::new(config.event_capacity);
        let detection = DetectionClient::new(&config.detection_base_url, config.request_timeout)
            .map_err(|e| deepsecure_common::Error::Config(format!("Detection client: {}", e)))?;
        let claims = ClaimClient::new(&config.claim_base_url, config.request_timeout)
            .map_err(|e| deepsecure_common::Error::Config(format!("Claim client: {}", e)))?;

        Ok(Self::from_parts(
            event_bus,
            detection,
            claims,
            SampleCatalog::new(config.samples_dir.clone()),
        ))
    }

    /// Assemble state from already-built clients
    pub fn from_parts(
        event_bus: EventBus,
        detection: DetectionClient,
        claims: ClaimClient,
        samples: SampleCatalog,
    ) -> Self {
        let last_error = Arc::new(RwLock::new(None));
        let records = RecordStore::new(event_bus.clone());
        let submitter = Submitter::new(records.clone(), Arc::new(detection), last_error.clone());

        Self {
            records,
            previews: PreviewStore::new(),
            submitter,
            claims: Arc::new(claims),
            samples: Arc::new(samples),
            event_bus,
            startup_time: Utc::now(),
            last_error,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        // UI routes (HTML pages)
        .merge(api::ui_routes())
        // API routes
        .merge(api::file_routes())
        .merge(api::preview_routes())
        .merge(api::sample_routes())
        .merge(api::track_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
