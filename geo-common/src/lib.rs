//! # geo-common
//!
//! Shared code for the geo-resolver service:
//! - Error and result types
//! - TOML / environment configuration loading
//! - Item store and table registry contracts
//! - Table field schemas
//! - SQLite initialization and the SQLite-backed store

pub mod config;
pub mod db;
pub mod error;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
pub use schema::{FieldDefinition, FieldType, SelectOption, TableInfo, TableSchema};
pub use store::{ItemFilter, ItemScope, ItemStore, StoredItem, TableRegistry};
