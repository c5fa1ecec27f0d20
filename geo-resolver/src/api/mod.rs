//! HTTP API handlers for geo-resolver

pub mod geocode;
pub mod health;

pub use geocode::geocode_routes;
pub use health::health_routes;
