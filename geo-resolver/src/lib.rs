//! geo-resolver library interface
//!
//! Address geocoding with a shared content-addressed cache, provider rate
//! limiting and per-project replication. Exposed as a library for the binary
//! and for integration tests.

pub mod api;
pub mod cache;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult, GeocodeError};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::cache::CacheScope;
use crate::services::GeocodingService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub geocoding: Arc<GeocodingService>,
    /// Project id reserved for the shared cache
    pub cache_scope: CacheScope,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(geocoding: Arc<GeocodingService>, cache_scope: CacheScope) -> Self {
        Self {
            geocoding,
            cache_scope,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::geocode_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
