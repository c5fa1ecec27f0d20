//! Cache key derivation
//!
//! Only leading/trailing whitespace is stripped. Case and internal spacing
//! are part of the key, so "Paris" and "paris" are separate cache entries.

use geo_common::ItemScope;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of hex characters of the digest kept in the key
const HASH_PREFIX_LEN: usize = 16;

/// Item-store project that partitions cache entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheScope(pub i64);

impl CacheScope {
    /// The cache shared by every project
    pub const GLOBAL: CacheScope = CacheScope(0);

    pub fn item_scope(self) -> ItemScope {
        ItemScope::project(self.0)
    }
}

impl fmt::Display for CacheScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address form the key is computed from
pub fn normalize_address(address: &str) -> &str {
    address.trim()
}

/// `geocode_<scope>_<first 16 hex chars of sha256(trimmed address)>`
pub fn cache_key(scope: CacheScope, address: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(normalize_address(address).as_bytes()));
    format!("geocode_{}_{}", scope, &digest[..HASH_PREFIX_LEN])
}
