//! Batch orchestrator
//!
//! Drives addresses through cache-then-provider resolution one at a time in
//! input order. Provider calls go through a shared [`RateLimiter`] and an
//! in-flight map so that neither one batch nor concurrent batches can call
//! the provider faster than the configured interval or twice for one key.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::confidence_scorer::ConfidenceScorer;
use super::in_flight::InFlightResolutions;
use super::provider::{GeocodeProvider, ResolutionMiss};
use super::rate_limiter::RateLimiter;
use crate::cache::GeocodeCache;
use crate::error::GeocodeError;
use crate::models::{BatchOutcome, CacheEntry, GeocodeResult, GeocodeResults};

/// Entry produced by a coalesced resolution
#[derive(Debug, Clone)]
struct Resolved {
    entry: CacheEntry,
    /// Found in the cache on the re-check, no provider call made
    from_cache: bool,
}

/// Cache-then-network geocoder with provider rate limiting
pub struct BatchGeocoder {
    cache: GeocodeCache,
    provider: Arc<dyn GeocodeProvider>,
    scorer: ConfidenceScorer,
    rate_limiter: RateLimiter,
    in_flight: InFlightResolutions<Option<Resolved>>,
}

impl BatchGeocoder {
    pub fn new(cache: GeocodeCache, provider: Arc<dyn GeocodeProvider>, min_interval: Duration) -> Self {
        Self {
            cache,
            provider,
            scorer: ConfidenceScorer::default(),
            rate_limiter: RateLimiter::new(min_interval),
            in_flight: InFlightResolutions::new(),
        }
    }

    pub fn with_scorer(mut self, scorer: ConfidenceScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn cache(&self) -> &GeocodeCache {
        &self.cache
    }

    /// Resolve one address; `None` for blank input or a provider miss
    pub async fn geocode_address(&self, address: &str) -> Option<GeocodeResult> {
        if address.trim().is_empty() {
            return None;
        }

        if let Some(entry) = self.lookup_cache(address).await {
            return Some(GeocodeResult::from_entry(&entry, true));
        }

        let key = self.cache.key_for(address);
        let resolved = self
            .in_flight
            .resolve(&key, || self.resolve_uncached(address))
            .await?;

        Some(GeocodeResult::from_entry(&resolved.entry, resolved.from_cache))
    }

    pub async fn geocode_batch(&self, addresses: &[String]) -> BatchOutcome {
        self.geocode_batch_with_progress(addresses, |_, _| {}).await
    }

    /// Resolve `addresses` in order, calling `progress(done, total)` after each
    pub async fn geocode_batch_with_progress<F>(&self, addresses: &[String], mut progress: F) -> BatchOutcome
    where
        F: FnMut(usize, usize) + Send,
    {
        let total = addresses.len();
        let started = Instant::now();
        let mut results = GeocodeResults::with_capacity(total);

        for (i, address) in addresses.iter().enumerate() {
            let result = self.geocode_address(address).await;
            results.insert(address.clone(), result);
            progress(i + 1, total);
        }

        let outcome = BatchOutcome::from_results(results);

        info!(
            total,
            cached = outcome.cached_count,
            new = outcome.new_count,
            failed = outcome.failed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch geocoding complete"
        );

        outcome
    }

    async fn lookup_cache(&self, address: &str) -> Option<CacheEntry> {
        match self.cache.try_get(address).await {
            Ok(Some(entry)) => {
                debug!(address = %address, "Cache hit");
                Some(entry)
            }
            Ok(None) => {
                debug!(address = %address, "Cache miss");
                None
            }
            Err(e @ GeocodeError::CacheReadCorruption { .. }) => {
                warn!(address = %address, error = %e, "Corrupt cache entry, resolving again");
                None
            }
            Err(e) => {
                warn!(address = %address, error = %e, "Cache read failed, resolving via provider");
                None
            }
        }
    }

    /// Runs at most once per key at a time (see [`InFlightResolutions`])
    async fn resolve_uncached(&self, address: &str) -> Option<Resolved> {
        // A resolution that finished between our cache check and now has
        // already written the entry
        if let Ok(Some(entry)) = self.cache.try_get(address).await {
            return Some(Resolved {
                entry,
                from_cache: true,
            });
        }

        self.rate_limiter.wait().await;

        let place = match self.provider.resolve(address).await {
            Ok(place) => place,
            Err(ResolutionMiss::NoResults) => {
                info!(address = %address, "No geocoding results");
                return None;
            }
            Err(miss) => {
                warn!(address = %address, reason = %miss, "Geocoding failed");
                return None;
            }
        };

        let entry = CacheEntry {
            id: self.cache.key_for(address),
            address: address.to_string(),
            lat: place.lat,
            lng: place.lng,
            confidence: self.scorer.score(&place.metadata),
            source: self.provider.source().to_string(),
            display_name: place.display_name,
        };

        if let Err(e) = self.cache.put(&entry).await {
            // The caller still gets the fresh result; the next batch pays for
            // another provider call
            warn!(address = %address, error = %e, "Failed to cache geocode result");
        }

        Some(Resolved {
            entry,
            from_cache: false,
        })
    }
}
