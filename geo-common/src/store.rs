//! Item store and table registry contracts
//!
//! The geocoding core only talks to storage through these traits. Each call
//! is self-contained: an implementation acquires whatever connection it needs
//! for the duration of the call and releases it before returning.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::schema::{TableInfo, TableSchema};
use crate::Result;

/// Where an item lives: a project, optionally narrowed to one of its tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ItemScope {
    pub project_id: i64,
    pub table_id: Option<i64>,
}

impl ItemScope {
    /// Whole project, no table restriction
    pub fn project(project_id: i64) -> Self {
        Self {
            project_id,
            table_id: None,
        }
    }

    /// A single table inside a project
    pub fn table(project_id: i64, table_id: i64) -> Self {
        Self {
            project_id,
            table_id: Some(table_id),
        }
    }
}

/// A stored record with its opaque JSON payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredItem {
    pub id: String,
    pub project_id: i64,
    pub table_id: Option<i64>,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload filter for [`ItemStore::query`]
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    /// Only items whose payload has this top-level key with this exact value
    pub field_equals: Option<(String, Value)>,
    /// Maximum number of items returned
    pub limit: Option<usize>,
}

impl ItemFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn field_eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field_equals: Some((key.into(), value.into())),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, payload: &Value) -> bool {
        match &self.field_equals {
            Some((key, expected)) => payload.get(key) == Some(expected),
            None => true,
        }
    }
}

/// Keyed records with an opaque JSON payload, scoped by project + table
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Read one item. A table-scoped read only matches items of that table.
    async fn get(&self, scope: ItemScope, key: &str) -> Result<Option<StoredItem>>;

    /// Create or replace the item `key` inside the project of `scope`
    async fn put(&self, scope: ItemScope, key: &str, payload: &Value) -> Result<()>;

    /// All matching items of the scope, in insertion order
    async fn query(&self, scope: ItemScope, filter: &ItemFilter) -> Result<Vec<StoredItem>>;
}

/// Per-project table catalogue
#[async_trait]
pub trait TableRegistry: Send + Sync {
    async fn list_tables(&self, project_id: i64) -> Result<Vec<TableInfo>>;

    async fn create_table(
        &self,
        project_id: i64,
        name: &str,
        schema: &TableSchema,
        description: Option<&str>,
    ) -> Result<TableInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matches_top_level_field() {
        let filter = ItemFilter::field_eq("is_custom", false);
        assert!(filter.matches(&json!({"is_custom": false, "lat": 1.0})));
        assert!(!filter.matches(&json!({"is_custom": true})));
        assert!(!filter.matches(&json!({"lat": 1.0})));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(ItemFilter::all().matches(&json!(null)));
        assert!(ItemFilter::all().with_limit(3).matches(&json!({"a": 1})));
    }
}
