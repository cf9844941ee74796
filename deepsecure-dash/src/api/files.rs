//! Uploaded-file API handlers
//!
//! POST /files, GET /files, GET|DELETE /files/:id, DELETE /files,
//! GET /files/:id/view, GET /files/:id/view.html
//!
//! Malformed record ids are answered with the JSON error envelope.

use axum::{
    extract::{rejection::PathRejection, Multipart, Path, Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Json, Router,
};
use deepsecure_common::events::{MediaCategory, RecordId};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::models::UploadedFile;
use crate::services::{present, FileIntake, IncomingFile, Rejection, ResultView};
use crate::AppState;

/// POST /files query
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub category: Option<MediaCategory>,
}

/// Intake response: records created plus files turned away
#[derive(Debug, Serialize)]
pub struct IntakeResponse {
    pub accepted: Vec<UploadedFile>,
    pub rejected: Vec<Rejection>,
}

/// DELETE /files response
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

/// Run intake for the category and start one submission per accepted file
pub async fn admit_files(
    state: &AppState,
    category: MediaCategory,
    files: Vec<IncomingFile>,
) -> IntakeResponse {
    let intake = FileIntake::new(category, state.previews.clone());
    let batch = intake.intake(files);

    let mut accepted = Vec::with_capacity(batch.accepted.len());
    for file in batch.accepted {
        let snapshot = file.record.clone();
        let id = state.records.insert(file.record, file.preview).await;
        // Re-read so the response carries the preview URL set on insert
        let record = state.records.get(id).await.unwrap_or(snapshot);
        state.submitter.spawn(id, file.media);
        accepted.push(record);
    }

    tracing::info!(
        category = %category,
        accepted = accepted.len(),
        rejected = batch.rejected.len(),
        "Intake complete"
    );

    IntakeResponse {
        accepted,
        rejected: batch.rejected,
    }
}

/// POST /files?category=image
///
/// Multipart upload; every part with a file name is a candidate file.
/// Returns 202 Accepted; results arrive through the record list and /events.
pub async fn upload_files(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<IntakeResponse>)> {
    let category = query.category.unwrap_or(MediaCategory::Image);

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read '{}': {}", name, e)))?;
        files.push(IncomingFile {
            name,
            content_type,
            bytes,
        });
    }

    if files.is_empty() {
        return Err(ApiError::BadRequest("No files in upload".to_string()));
    }

    let response = admit_files(&state, category, files).await;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// GET /files
pub async fn list_files(State(state): State<AppState>) -> Json<Vec<UploadedFile>> {
    Json(state.records.list().await)
}

async fn find(state: &AppState, id: RecordId) -> ApiResult<UploadedFile> {
    state
        .records
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Record {}", id)))
}

/// GET /files/:id
pub async fn get_file(
    State(state): State<AppState>,
    id: Result<Path<RecordId>, PathRejection>,
) -> ApiResult<Json<UploadedFile>> {
    let Path(id) = id?;
    Ok(Json(find(&state, id).await?))
}

/// GET /files/:id/view
pub async fn view_file(
    State(state): State<AppState>,
    id: Result<Path<RecordId>, PathRejection>,
) -> ApiResult<Json<ResultView>> {
    let Path(id) = id?;
    Ok(Json(present(&find(&state, id).await?)))
}

/// GET /files/:id/view.html
pub async fn view_file_html(
    State(state): State<AppState>,
    id: Result<Path<RecordId>, PathRejection>,
) -> ApiResult<Html<String>> {
    let Path(id) = id?;
    Ok(Html(present(&find(&state, id).await?).to_html()))
}

/// DELETE /files/:id
///
/// Removes the record and releases its preview. An in-flight submission
/// keeps running; its result is discarded.
pub async fn remove_file(
    State(state): State<AppState>,
    id: Result<Path<RecordId>, PathRejection>,
) -> ApiResult<Json<UploadedFile>> {
    let Path(id) = id?;
    Ok(Json(state.records.remove(id).await?))
}

/// DELETE /files
pub async fn clear_files(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.records.clear().await;
    Json(ClearResponse { removed })
}

/// Build file routes
pub fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/files", get(list_files).post(upload_files).delete(clear_files))
        .route("/files/:id", get(get_file).delete(remove_file))
        .route("/files/:id/view", get(view_file))
        .route("/files/:id/view.html", get(view_file_html))
}
