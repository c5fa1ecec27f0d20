//! Geocoding provider contract

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a lookup produced no coordinates
///
/// A miss is an ordinary outcome for one address, not a batch failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionMiss {
    #[error("provider returned no results")]
    NoResults,

    #[error("provider returned HTTP {0}")]
    HttpStatus(u16),

    #[error("provider request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unreadable provider response: {0}")]
    Parse(String),
}

/// Provider metadata used for confidence scoring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceMetadata {
    /// Provider relevance metric, usually in [0, 1]
    pub importance: Option<f64>,
    /// Structured address breakdown (road, city, country, ...)
    pub address_details: Map<String, Value>,
}

impl PlaceMetadata {
    pub fn detail_field_count(&self) -> usize {
        self.address_details.len()
    }
}

/// First result of a successful lookup
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPlace {
    pub lat: f64,
    pub lng: f64,
    pub display_name: String,
    pub metadata: PlaceMetadata,
}

/// One HTTP lookup per call; spacing between calls is the caller's job
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Identifier stored as `source` on cache entries
    fn source(&self) -> &str;

    async fn resolve(&self, address: &str) -> Result<ProviderPlace, ResolutionMiss>;
}
