//! Shared geocode cache: key derivation and item-store adapter

pub mod key;
pub mod store;

pub use key::{cache_key, normalize_address, CacheScope};
pub use store::GeocodeCache;
