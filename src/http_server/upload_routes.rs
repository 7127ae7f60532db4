//! Upload HTTP Routes

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use tracing::info;

use crate::upload::{UploadRequest, UploadResponse, MAX_UPLOAD_MB};

use super::errors::{ApiError, ApiJson};
use super::response::ApiResponse;
use super::state::AppState;

/// Base64 inflates by 4/3; leave room for the JSON around it
pub(super) const UPLOAD_BODY_LIMIT: usize = (MAX_UPLOAD_MB as usize) * 1024 * 1024 * 3 / 2;

pub fn upload_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/upload", post(upload_image))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .with_state(state)
}

/// Accept a base64 image data URL and return the URL it is kept under
async fn upload_image(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<UploadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let image = request.accept().map_err(ApiError::from_upload)?;
    let url = state.sink.store(&image).map_err(ApiError::from_upload)?;

    info!(
        file_name = image.file_name.as_deref().unwrap_or("-"),
        bytes = image.estimated_bytes,
        "image accepted"
    );
    Ok(Json(ApiResponse::ok(UploadResponse { url })))
}
