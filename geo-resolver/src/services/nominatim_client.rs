//! OpenStreetMap Nominatim search client
//!
//! Endpoint: `GET {base_url}/search?q=..&format=json&limit=1&addressdetails=1`
//!
//! Nominatim's usage policy requires an identifying User-Agent and at most
//! one request per second. The User-Agent is set here; spacing is enforced
//! by [`BatchGeocoder`](super::batch_geocoder::BatchGeocoder).

use async_trait::async_trait;
use geo_common::config::GeocoderConfig;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::provider::{GeocodeProvider, PlaceMetadata, ProviderPlace, ResolutionMiss};
use crate::error::GeocodeError;

/// Nominatim reports coordinates as strings; accept numbers too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Text(String),
    Number(f64),
}

impl Coordinate {
    fn parse(&self, field: &str) -> Result<f64, ResolutionMiss> {
        let value = match self {
            Coordinate::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|e| ResolutionMiss::Parse(format!("{} '{}': {}", field, text, e)))?,
            Coordinate::Number(n) => *n,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ResolutionMiss::Parse(format!("{} is not finite", field)))
        }
    }
}

/// One element of the search response array
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: Coordinate,
    lon: Coordinate,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    importance: Option<f64>,
    #[serde(default)]
    address: Option<Map<String, Value>>,
}

impl NominatimPlace {
    fn into_place(self) -> Result<ProviderPlace, ResolutionMiss> {
        Ok(ProviderPlace {
            lat: self.lat.parse("lat")?,
            lng: self.lon.parse("lon")?,
            display_name: self.display_name.unwrap_or_default(),
            metadata: PlaceMetadata {
                importance: self.importance,
                address_details: self.address.unwrap_or_default(),
            },
        })
    }
}

fn transport_miss(e: reqwest::Error) -> ResolutionMiss {
    if e.is_timeout() {
        ResolutionMiss::Timeout
    } else if e.is_decode() {
        ResolutionMiss::Parse(e.to_string())
    } else {
        ResolutionMiss::Transport(e.to_string())
    }
}

/// Nominatim search client
pub struct NominatimClient {
    http_client: Client,
    search_url: String,
    source: String,
}

impl NominatimClient {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let http_client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .map_err(|e| GeocodeError::HttpClient(e.to_string()))?;

        Ok(Self {
            http_client,
            search_url: format!("{}/search", config.base_url.trim_end_matches('/')),
            source: config.source.clone(),
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

#[async_trait]
impl GeocodeProvider for NominatimClient {
    fn source(&self) -> &str {
        &self.source
    }

    async fn resolve(&self, address: &str) -> Result<ProviderPlace, ResolutionMiss> {
        debug!(address = %address, url = %self.search_url, "Querying Nominatim");

        let response = self
            .http_client
            .get(&self.search_url)
            .query(&[
                ("q", address),
                ("format", "json"),
                ("limit", "1"),
                ("addressdetails", "1"),
            ])
            .send()
            .await
            .map_err(transport_miss)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ResolutionMiss::HttpStatus(status.as_u16()));
        }

        let places: Vec<NominatimPlace> = response.json().await.map_err(transport_miss)?;

        let place = places
            .into_iter()
            .next()
            .ok_or(ResolutionMiss::NoResults)?
            .into_place()?;

        debug!(
            address = %address,
            lat = place.lat,
            lng = place.lng,
            display_name = %place.display_name,
            "Nominatim resolved address"
        );

        Ok(place)
    }
}
