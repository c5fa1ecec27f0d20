//! Geocoding data model

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

fn default_confidence() -> f64 {
    0.8
}

fn default_source() -> String {
    geo_common::config::DEFAULT_SOURCE.to_string()
}

/// Shared cache record, one per normalized address and cache scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache key this entry is stored under
    #[serde(default)]
    pub id: String,
    /// Raw address as first seen
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub display_name: String,
}

impl CacheEntry {
    /// Coordinates are finite and confidence lies in [0, 1]
    pub fn is_well_formed(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (0.0..=1.0).contains(&self.confidence)
    }
}

/// Per-address answer returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub lat: f64,
    pub lng: f64,
    pub confidence: f64,
    pub source: String,
    pub display_name: String,
    /// Served from the cache without a provider call
    pub cached: bool,
}

impl GeocodeResult {
    pub fn from_entry(entry: &CacheEntry, cached: bool) -> Self {
        Self {
            lat: entry.lat,
            lng: entry.lng,
            confidence: entry.confidence,
            source: entry.source.clone(),
            display_name: entry.display_name.clone(),
            cached,
        }
    }
}

/// Address → result mapping that keeps first-seen order
///
/// Inserting an address again replaces its value but keeps its position.
/// Serializes as a JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodeResults {
    entries: Vec<(String, Option<GeocodeResult>)>,
    positions: HashMap<String, usize>,
}

impl GeocodeResults {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, address: String, result: Option<GeocodeResult>) {
        match self.positions.get(&address) {
            Some(&pos) => self.entries[pos].1 = result,
            None => {
                self.positions.insert(address.clone(), self.entries.len());
                self.entries.push((address, result));
            }
        }
    }

    /// `None` if the address is absent, `Some(None)` if it failed
    pub fn get(&self, address: &str) -> Option<&Option<GeocodeResult>> {
        self.positions.get(address).map(|&pos| &self.entries[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&GeocodeResult>)> {
        self.entries.iter().map(|(a, r)| (a.as_str(), r.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for GeocodeResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (address, result) in &self.entries {
            map.serialize_entry(address, result)?;
        }
        map.end()
    }
}

/// Result of one batch pass, counts computed after the pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub results: GeocodeResults,
    pub cached_count: usize,
    pub new_count: usize,
    pub failed: Vec<String>,
}

impl BatchOutcome {
    pub fn from_results(results: GeocodeResults) -> Self {
        let mut cached_count = 0;
        let mut new_count = 0;
        let mut failed = Vec::new();

        for (address, result) in results.iter() {
            match result {
                Some(r) if r.cached => cached_count += 1,
                Some(_) => new_count += 1,
                None => failed.push(address.to_string()),
            }
        }

        Self {
            results,
            cached_count,
            new_count,
            failed,
        }
    }
}

/// Project-local, user-editable copy of a resolved address
///
/// Snapshot taken at copy time; nothing links it back to the cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectGeoRecord {
    pub id: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub confidence: f64,
    pub source: String,
    pub display_name: String,
    /// Set by user edits outside this service
    pub is_custom: bool,
}

/// Outcome of geocode-then-copy for one project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicationSummary {
    pub results: GeocodeResults,
    pub cached_count: usize,
    pub new_count: usize,
    pub copied_count: usize,
    pub failed: Vec<String>,
    pub local_table_id: i64,
    /// Caller's address field, echoed back unchanged
    pub field_name: String,
}

/// Response shape shared by synchronous, replicated and detached runs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeSummary {
    pub results: GeocodeResults,
    pub failed: Vec<String>,
    pub cached_count: usize,
    pub new_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copied_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_table_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GeocodeSummary {
    /// Immediate answer for a detached run
    pub fn pending(address_count: usize) -> Self {
        Self {
            results: GeocodeResults::default(),
            failed: Vec::new(),
            cached_count: 0,
            new_count: 0,
            copied_count: None,
            local_table_id: None,
            message: Some(format!("Geocoding {} addresses in background", address_count)),
        }
    }
}

impl From<BatchOutcome> for GeocodeSummary {
    fn from(outcome: BatchOutcome) -> Self {
        Self {
            results: outcome.results,
            failed: outcome.failed,
            cached_count: outcome.cached_count,
            new_count: outcome.new_count,
            copied_count: None,
            local_table_id: None,
            message: None,
        }
    }
}

impl From<ReplicationSummary> for GeocodeSummary {
    fn from(summary: ReplicationSummary) -> Self {
        Self {
            results: summary.results,
            failed: summary.failed,
            cached_count: summary.cached_count,
            new_count: summary.new_count,
            copied_count: Some(summary.copied_count),
            local_table_id: Some(summary.local_table_id),
            message: None,
        }
    }
}
