//! Sample files
//!
//! GET /samples lists the catalogue, POST /samples/:name runs a sample
//! through the normal intake path.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::files::{admit_files, IntakeResponse};
use crate::error::ApiResult;
use crate::services::SampleEntry;
use crate::AppState;

/// GET /samples
pub async fn list_samples(State(state): State<AppState>) -> Json<Vec<SampleEntry>> {
    Json(state.samples.entries().to_vec())
}

/// POST /samples/:name
pub async fn try_sample(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<(StatusCode, Json<IntakeResponse>)> {
    let (entry, file) = state.samples.load(&name).await?;
    tracing::info!(sample = %name, category = %entry.category, "Trying sample");

    let response = admit_files(&state, entry.category, vec![file]).await;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

pub fn sample_routes() -> Router<AppState> {
    Router::new()
        .route("/samples", get(list_samples))
        .route("/samples/:name", post(try_sample))
}
