//! Claim verification ("Track") handlers
//!
//! POST /track (multipart `claim` + `image`), POST /track/url

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use deepsecure_common::events::DashEvent;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::models::ClaimAnalysis;
use crate::services::{present_claim, resolve_mime, ClaimView, IncomingFile, MediaFile};
use crate::AppState;

/// Claim result together with its rendered view
#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub analysis: ClaimAnalysis,
    pub view: ClaimView,
}

impl TrackResponse {
    fn new(analysis: ClaimAnalysis) -> Self {
        let view = present_claim(&analysis);
        Self { analysis, view }
    }
}

/// POST /track/url request
#[derive(Debug, Deserialize)]
pub struct TrackUrlRequest {
    pub url: String,
    #[serde(default)]
    pub claim: Option<String>,
}

/// POST /track
///
/// Empty claims and non-visual files are rejected with 400 before the
/// service is called. Service failures come back as a failed analysis.
pub async fn track_claim(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<TrackResponse>> {
    let mut claim = None;
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let part = field.name().map(str::to_string);
        match part.as_deref() {
            Some("claim") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read claim: {}", e)))?;
                claim = Some(text);
            }
            Some("image") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                upload = Some(IncomingFile {
                    name,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    let claim = claim.unwrap_or_default();
    let upload = upload.ok_or_else(|| ApiError::BadRequest("No file to track".to_string()))?;
    let file = MediaFile {
        mime_type: resolve_mime(&upload),
        name: upload.name,
        bytes: upload.bytes,
    };

    let analysis = state.claims.verify(&claim, &file).await?;
    if analysis.is_failure() {
        *state.last_error.write().await = Some(analysis.assessment.reasoning.clone());
    }

    state.event_bus.emit_lossy(DashEvent::ClaimAnalyzed {
        verdict: analysis.assessment.verdict.clone(),
        confidence: analysis.assessment.confidence,
        failed: analysis.is_failure(),
        timestamp: Utc::now(),
    });

    Ok(Json(TrackResponse::new(analysis)))
}

/// POST /track/url
///
/// The service only analyses uploaded files, so this always reports that
/// URL analysis is unsupported.
pub async fn track_url(Json(request): Json<TrackUrlRequest>) -> ApiResult<Json<TrackResponse>> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(ApiError::BadRequest("URL is required".to_string()));
    }

    tracing::debug!(url = %url, "URL tracking requested");
    Ok(Json(TrackResponse::new(ClaimAnalysis::url_not_supported(
        request.claim.as_deref(),
        url,
    ))))
}

pub fn track_routes() -> Router<AppState> {
    Router::new()
        .route("/track", post(track_claim))
        .route("/track/url", post(track_url))
}
