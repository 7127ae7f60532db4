//! Manual HTTP Routes
//!
//! CRUD endpoints for manuals. Validation failures answer 400; every
//! store-layer failure answers 500 with a scrubbed message.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::manual::{ManualPatch, NewManual, MAX_IMAGES};

use super::errors::{ApiError, ApiJson};
use super::response::ApiResponse;
use super::state::AppState;
use super::upload_routes::UPLOAD_BODY_LIMIT;

/// Room for a full set of images echoed back by `/upload`
const MANUAL_BODY_LIMIT: usize = MAX_IMAGES * UPLOAD_BODY_LIMIT;

/// Manual routes with shared state
pub fn manual_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/manuals", get(list_manuals).post(create_manual))
        .route(
            "/manuals/:id",
            get(get_manual).patch(update_manual).delete(delete_manual),
        )
        .layer(DefaultBodyLimit::max(MANUAL_BODY_LIMIT))
        .with_state(state)
}

// ==================
// Handlers
// ==================

/// All manuals, newest first
async fn list_manuals(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let manuals = state
        .store
        .list_all()
        .await
        .map_err(|e| ApiError::from_store(e, &state.scrubber, "Failed to fetch manuals"))?;

    Ok(Json(ApiResponse::ok(manuals)))
}

async fn create_manual(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<NewManual>,
) -> Result<impl IntoResponse, ApiError> {
    let manual = state
        .store
        .create(input)
        .await
        .map_err(|e| ApiError::from_store(e, &state.scrubber, "Failed to create manual"))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(manual))))
}

async fn get_manual(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let manual = state
        .store
        .get_by_id(&id)
        .await
        .map_err(|e| ApiError::from_store(e, &state.scrubber, "Failed to fetch manual"))?;

    Ok(Json(ApiResponse::ok(manual)))
}

async fn update_manual(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ManualPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let manual = state
        .store
        .update(&id, patch)
        .await
        .map_err(|e| ApiError::from_store(e, &state.scrubber, "Failed to update manual"))?;

    Ok(Json(ApiResponse::ok(manual)))
}

async fn delete_manual(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .store
        .archive(&id)
        .await
        .map_err(|e| ApiError::from_store(e, &state.scrubber, "Failed to delete manual"))?;

    Ok(Json(ApiResponse::ok(())))
}
