//! Geocoding API handlers
//!
//! POST /api/projects/:project_id/geocode, GET /api/projects/:project_id/geocodes

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    models::{GeocodeSummary, ProjectGeoRecord},
    services::GeocodeRequest,
    AppState,
};

fn default_copy_to_project() -> bool {
    true
}

/// POST /api/projects/:project_id/geocode request
#[derive(Debug, Deserialize)]
pub struct GeocodeBatchRequest {
    /// Addresses in caller order; blanks and duplicates are allowed
    pub addresses: Vec<String>,
    #[serde(default)]
    pub field_name: String,
    #[serde(default = "default_copy_to_project")]
    pub copy_to_project: bool,
    /// Answer immediately and resolve in a detached task
    #[serde(default)]
    pub background: bool,
}

/// GET /api/projects/:project_id/geocodes response
#[derive(Debug, Serialize)]
pub struct LocalGeocodesResponse {
    pub project_id: i64,
    pub records: Vec<ProjectGeoRecord>,
}

/// POST /api/projects/:project_id/geocode
///
/// Resolve addresses through the shared cache and optionally copy the
/// results into the project's local geo table.
pub async fn geocode_addresses(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
    Json(request): Json<GeocodeBatchRequest>,
) -> ApiResult<Json<GeocodeSummary>> {
    if project_id < 0 {
        return Err(ApiError::BadRequest(format!(
            "Invalid project id: {}",
            project_id
        )));
    }
    if request.copy_to_project && project_id == state.cache_scope.0 {
        return Err(ApiError::BadRequest(format!(
            "Project {} holds the shared geocode cache and cannot receive copies",
            project_id
        )));
    }

    let geocode_request = GeocodeRequest {
        addresses: request.addresses,
        project_id,
        field_name: request.field_name,
        copy_to_project: request.copy_to_project,
    };

    if request.background {
        let (pending, _handle) = state.geocoding.spawn_background(geocode_request);
        return Ok(Json(pending));
    }

    let summary = state.geocoding.run(&geocode_request).await?;
    Ok(Json(summary))
}

/// GET /api/projects/:project_id/geocodes
pub async fn list_local_geocodes(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<LocalGeocodesResponse>> {
    let records = state
        .geocoding
        .replicator()
        .list_local_records(project_id)
        .await?;

    tracing::debug!(project_id, count = records.len(), "Listed local geocodes");

    Ok(Json(LocalGeocodesResponse {
        project_id,
        records,
    }))
}

/// Build geocoding routes
pub fn geocode_routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects/:project_id/geocode", post(geocode_addresses))
        .route("/api/projects/:project_id/geocodes", get(list_local_geocodes))
}
