//! Cache store adapter
//!
//! Reads and upserts [`CacheEntry`] payloads in the item store under the
//! injected [`CacheScope`]. There is no staleness layer: a `put` is visible
//! to the next `get` for the same address.

use geo_common::ItemStore;
use std::sync::Arc;
use tracing::{debug, warn};

use super::key::{cache_key, CacheScope};
use crate::error::GeocodeError;
use crate::models::CacheEntry;

/// Geocode cache backed by the generic item store
#[derive(Clone)]
pub struct GeocodeCache {
    store: Arc<dyn ItemStore>,
    scope: CacheScope,
}

impl GeocodeCache {
    pub fn new(store: Arc<dyn ItemStore>, scope: CacheScope) -> Self {
        Self { store, scope }
    }

    pub fn scope(&self) -> CacheScope {
        self.scope
    }

    pub fn key_for(&self, address: &str) -> String {
        cache_key(self.scope, address)
    }

    /// Look up `address`, reporting corruption and store failures as errors
    pub async fn try_get(&self, address: &str) -> Result<Option<CacheEntry>, GeocodeError> {
        let key = self.key_for(address);

        let item = match self.store.get(self.scope.item_scope(), &key).await {
            Ok(item) => item,
            Err(geo_common::Error::Serialization(e)) => {
                return Err(GeocodeError::CacheReadCorruption {
                    key,
                    reason: e.to_string(),
                })
            }
            Err(e) => return Err(GeocodeError::Store(e)),
        };

        let Some(item) = item else {
            return Ok(None);
        };

        let mut entry: CacheEntry = serde_json::from_value(item.data).map_err(|e| {
            GeocodeError::CacheReadCorruption {
                key: key.clone(),
                reason: e.to_string(),
            }
        })?;

        if !entry.is_well_formed() {
            return Err(GeocodeError::CacheReadCorruption {
                key,
                reason: "coordinates or confidence out of range".to_string(),
            });
        }

        if entry.id.is_empty() {
            entry.id = key;
        }

        Ok(Some(entry))
    }

    /// Look up `address`; corruption and read failures count as a miss
    pub async fn get(&self, address: &str) -> Option<CacheEntry> {
        match self.try_get(address).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(address = %address, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Upsert `entry` under the key derived from its address
    pub async fn put(&self, entry: &CacheEntry) -> Result<(), GeocodeError> {
        let key = self.key_for(&entry.address);

        let mut stored = entry.clone();
        stored.id = key.clone();

        let payload = serde_json::to_value(&stored).map_err(|e| GeocodeError::CachePersistence {
            key: key.clone(),
            source: geo_common::Error::Serialization(e),
        })?;

        self.store
            .put(self.scope.item_scope(), &key, &payload)
            .await
            .map_err(|source| GeocodeError::CachePersistence {
                key: key.clone(),
                source,
            })?;

        debug!(
            address = %entry.address,
            key = %key,
            lat = entry.lat,
            lng = entry.lng,
            "Cached geocode result"
        );
        Ok(())
    }
}
