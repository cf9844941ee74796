//! Preview resources
//!
//! GET /previews/:token serves preview bytes while the owning record exists.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /previews/:token
pub async fn get_preview(
    State(state): State<AppState>,
    token: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(token) = token?;
    let (mime_type, bytes) = state
        .previews
        .get(token)
        .ok_or_else(|| ApiError::NotFound(format!("Preview {}", token)))?;

    Ok((
        [
            (header::CONTENT_TYPE, mime_type),
            (header::CACHE_CONTROL, "no-store".to_string()),
            // Uploaded content (SVG included) must not run as dashboard script
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
            (header::CONTENT_SECURITY_POLICY, "sandbox".to_string()),
        ],
        bytes,
    ))
}

pub fn preview_routes() -> Router<AppState> {
    Router::new().route("/previews/:token", get(get_preview))
}
