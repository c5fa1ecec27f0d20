//! Geocoding services

pub mod batch_geocoder;
pub mod confidence_scorer;
pub mod in_flight;
pub mod nominatim_client;
pub mod project_replicator;
pub mod provider;
pub mod rate_limiter;

pub use batch_geocoder::BatchGeocoder;
pub use confidence_scorer::ConfidenceScorer;
pub use in_flight::InFlightResolutions;
pub use nominatim_client::NominatimClient;
pub use project_replicator::{ProjectReplicator, LOCAL_GEO_TABLE_NAME};
pub use provider::{GeocodeProvider, PlaceMetadata, ProviderPlace, ResolutionMiss};
pub use rate_limiter::RateLimiter;

use geo_common::{ItemStore, TableRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::cache::{CacheScope, GeocodeCache};
use crate::error::GeocodeError;
use crate::models::GeocodeSummary;

/// One batch resolution request
#[derive(Debug, Clone)]
pub struct GeocodeRequest {
    pub addresses: Vec<String>,
    pub project_id: i64,
    pub field_name: String,
    /// Copy successful results into the project's local geo table
    pub copy_to_project: bool,
}

/// Orchestrator plus replication, shared by every request
pub struct GeocodingService {
    geocoder: Arc<BatchGeocoder>,
    replicator: Arc<ProjectReplicator>,
}

impl GeocodingService {
    pub fn new<S>(
        store: Arc<S>,
        provider: Arc<dyn GeocodeProvider>,
        scope: CacheScope,
        min_interval: Duration,
    ) -> Self
    where
        S: ItemStore + TableRegistry + 'static,
    {
        let cache = GeocodeCache::new(store.clone(), scope);
        let geocoder = Arc::new(BatchGeocoder::new(cache, provider, min_interval));
        let replicator = Arc::new(ProjectReplicator::new(
            geocoder.clone(),
            store.clone(),
            store,
        ));
        Self {
            geocoder,
            replicator,
        }
    }

    pub fn geocoder(&self) -> &Arc<BatchGeocoder> {
        &self.geocoder
    }

    pub fn replicator(&self) -> &Arc<ProjectReplicator> {
        &self.replicator
    }

    /// Run the request to completion
    pub async fn run(&self, request: &GeocodeRequest) -> Result<GeocodeSummary, GeocodeError> {
        run_request(&self.geocoder, &self.replicator, request).await
    }

    /// Start the request as a detached task and answer immediately
    ///
    /// The returned summary carries zero counts and a pending message. The
    /// handle is only needed by callers that want to observe completion.
    pub fn spawn_background(
        &self,
        request: GeocodeRequest,
    ) -> (GeocodeSummary, JoinHandle<Result<GeocodeSummary, GeocodeError>>) {
        let pending = GeocodeSummary::pending(request.addresses.len());
        let geocoder = self.geocoder.clone();
        let replicator = self.replicator.clone();

        let handle = tokio::spawn(async move {
            tracing::info!(
                project_id = request.project_id,
                count = request.addresses.len(),
                "Background geocoding task started"
            );

            let result = run_request(&geocoder, &replicator, &request).await;
            match &result {
                Ok(summary) => tracing::info!(
                    project_id = request.project_id,
                    cached = summary.cached_count,
                    new = summary.new_count,
                    failed = summary.failed.len(),
                    "Background geocoding task completed"
                ),
                Err(e) => tracing::error!(
                    project_id = request.project_id,
                    error = %e,
                    "Background geocoding task failed"
                ),
            }
            result
        });

        (pending, handle)
    }
}

async fn run_request(
    geocoder: &BatchGeocoder,
    replicator: &ProjectReplicator,
    request: &GeocodeRequest,
) -> Result<GeocodeSummary, GeocodeError> {
    if request.copy_to_project {
        let summary = replicator
            .geocode_and_copy(&request.addresses, request.project_id, &request.field_name)
            .await?;
        Ok(summary.into())
    } else {
        Ok(geocoder.geocode_batch(&request.addresses).await.into())
    }
}
