//! Shared fixtures for geo-resolver integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use geo_common::db::{create_schema, SqliteStore};
use geo_resolver::cache::CacheScope;
use geo_resolver::services::{GeocodeProvider, GeocodingService, PlaceMetadata, ProviderPlace, ResolutionMiss};
use serde_json::{json, Map};
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Provider stub answering from a fixed table, recording every call
pub struct StubProvider {
    places: HashMap<String, ProviderPlace>,
    calls: AtomicUsize,
    call_log: Mutex<Vec<(String, Instant)>>,
    latency: Duration,
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            places: HashMap::new(),
            calls: AtomicUsize::new(0),
            call_log: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    pub fn with_place(mut self, address: &str, lat: f64, lng: f64) -> Self {
        let mut details = Map::new();
        details.insert("city".to_string(), json!(address));
        details.insert("country".to_string(), json!("Testland"));

        self.places.insert(
            address.to_string(),
            ProviderPlace {
                lat,
                lng,
                display_name: format!("{}, Testland", address),
                metadata: PlaceMetadata {
                    importance: Some(0.5),
                    address_details: details,
                },
            },
        );
        self
    }

    /// Delay every answer, to keep concurrent callers overlapping
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn called_addresses(&self) -> Vec<String> {
        self.call_log.lock().unwrap().iter().map(|(a, _)| a.clone()).collect()
    }

    pub fn call_instants(&self) -> Vec<Instant> {
        self.call_log.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl GeocodeProvider for StubProvider {
    fn source(&self) -> &str {
        "stub"
    }

    async fn resolve(&self, address: &str) -> Result<ProviderPlace, ResolutionMiss> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_log
            .lock()
            .unwrap()
            .push((address.to_string(), Instant::now()));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.places
            .get(address)
            .cloned()
            .ok_or(ResolutionMiss::NoResults)
    }
}

/// Paris as resolved in the scenarios
pub fn paris_provider() -> StubProvider {
    StubProvider::new().with_place("Paris", 48.8566, 2.3522)
}

/// SQLite store on a single-connection in-memory database
pub async fn memory_store() -> Arc<SqliteStore> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    create_schema(&pool).await.unwrap();
    Arc::new(SqliteStore::new(pool))
}

/// Service over `store` with a short provider interval
pub fn service_with(
    store: Arc<SqliteStore>,
    provider: Arc<StubProvider>,
    min_interval: Duration,
) -> GeocodingService {
    GeocodingService::new(store, provider, CacheScope::GLOBAL, min_interval)
}

pub fn addresses(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
