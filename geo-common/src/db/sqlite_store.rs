//! SQLite implementation of [`ItemStore`] and [`TableRegistry`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;

use crate::schema::{TableInfo, TableSchema};
use crate::store::{ItemFilter, ItemScope, ItemStore, StoredItem, TableRegistry};
use crate::{Error, Result};

/// Item store and table registry over one SQLite pool
///
/// Every operation checks a connection out of the pool for its own duration;
/// nothing is held between calls.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn item_from_row(row: &SqliteRow) -> Result<StoredItem> {
    let raw: String = row.try_get("data")?;
    let data: Value = serde_json::from_str(&raw)?;

    Ok(StoredItem {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        table_id: row.try_get("table_id")?,
        data,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn table_from_row(row: &SqliteRow) -> Result<TableInfo> {
    let raw_schema: String = row.try_get("schema")?;
    let schema: TableSchema = serde_json::from_str(&raw_schema)?;

    Ok(TableInfo {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        schema,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

#[async_trait]
impl ItemStore for SqliteStore {
    async fn get(&self, scope: ItemScope, key: &str) -> Result<Option<StoredItem>> {
        let row = match scope.table_id {
            Some(table_id) => {
                sqlx::query(
                    "SELECT * FROM items WHERE project_id = ? AND id = ? AND table_id = ?",
                )
                .bind(scope.project_id)
                .bind(key)
                .bind(table_id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM items WHERE project_id = ? AND id = ?")
                    .bind(scope.project_id)
                    .bind(key)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        row.as_ref().map(item_from_row).transpose()
    }

    async fn put(&self, scope: ItemScope, key: &str, payload: &Value) -> Result<()> {
        let data = serde_json::to_string(payload)?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO items (project_id, id, table_id, data, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(project_id, id) DO UPDATE SET
                table_id = excluded.table_id,
                data = excluded.data,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(scope.project_id)
        .bind(key)
        .bind(scope.table_id)
        .bind(data)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(project_id = scope.project_id, table_id = ?scope.table_id, key = %key, "Item upserted");
        Ok(())
    }

    async fn query(&self, scope: ItemScope, filter: &ItemFilter) -> Result<Vec<StoredItem>> {
        let rows = match scope.table_id {
            Some(table_id) => {
                sqlx::query("SELECT * FROM items WHERE project_id = ? AND table_id = ? ORDER BY rowid")
                    .bind(scope.project_id)
                    .bind(table_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM items WHERE project_id = ? ORDER BY rowid")
                    .bind(scope.project_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut items = Vec::new();
        for row in &rows {
            let item = item_from_row(row)?;
            if filter.matches(&item.data) {
                items.push(item);
                if filter.limit.is_some_and(|limit| items.len() >= limit) {
                    break;
                }
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl TableRegistry for SqliteStore {
    async fn list_tables(&self, project_id: i64) -> Result<Vec<TableInfo>> {
        let rows = sqlx::query("SELECT * FROM data_tables WHERE project_id = ? ORDER BY id")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(table_from_row).collect()
    }

    async fn create_table(
        &self,
        project_id: i64,
        name: &str,
        schema: &TableSchema,
        description: Option<&str>,
    ) -> Result<TableInfo> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("table name must not be empty".to_string()));
        }
        schema.validate()?;

        let schema_json = serde_json::to_string(schema)?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO data_tables (project_id, name, description, schema, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(project_id)
        .bind(name)
        .bind(description)
        .bind(schema_json)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(project_id, table_id = id, name = %name, "Table created");

        Ok(TableInfo {
            id,
            project_id,
            name: name.to_string(),
            description: description.map(str::to_string),
            schema: schema.clone(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDefinition, FieldType};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_store() -> SqliteStore {
        // A single connection keeps every query on the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::create_schema(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = test_store().await;
        let scope = ItemScope::project(0);

        store.put(scope, "k1", &json!({"lat": 1.5})).await.unwrap();
        let item = store.get(scope, "k1").await.unwrap().unwrap();

        assert_eq!(item.id, "k1");
        assert_eq!(item.project_id, 0);
        assert_eq!(item.table_id, None);
        assert_eq!(item.data, json!({"lat": 1.5}));
    }

    #[tokio::test]
    async fn test_put_replaces_existing_payload() {
        let store = test_store().await;
        let scope = ItemScope::project(0);

        store.put(scope, "k1", &json!({"v": 1})).await.unwrap();
        store.put(scope, "k1", &json!({"v": 2})).await.unwrap();

        let items = store.query(scope, &ItemFilter::all()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].data, json!({"v": 2}));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = test_store().await;
        assert!(store.get(ItemScope::project(3), "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_projects_are_isolated() {
        let store = test_store().await;
        store.put(ItemScope::project(1), "same", &json!({"p": 1})).await.unwrap();
        store.put(ItemScope::project(2), "same", &json!({"p": 2})).await.unwrap();

        let a = store.get(ItemScope::project(1), "same").await.unwrap().unwrap();
        let b = store.get(ItemScope::project(2), "same").await.unwrap().unwrap();
        assert_eq!(a.data, json!({"p": 1}));
        assert_eq!(b.data, json!({"p": 2}));
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_serialization_error() {
        let store = test_store().await;
        let now = Utc::now();
        sqlx::query("INSERT INTO items (project_id, id, table_id, data, created_at, updated_at) VALUES (0, 'bad', NULL, '{not json', ?, ?)")
            .bind(now)
            .bind(now)
            .execute(store.pool())
            .await
            .unwrap();

        let result = store.get(ItemScope::project(0), "bad").await;
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[tokio::test]
    async fn test_query_by_table_filter_and_limit() {
        let store = test_store().await;
        let schema = TableSchema::new(vec![FieldDefinition::new("name", "Name", FieldType::Text)]);
        let table = store.create_table(5, "people", &schema, None).await.unwrap();

        for i in 0..4 {
            store
                .put(ItemScope::table(5, table.id), &format!("row{}", i), &json!({"even": i % 2 == 0, "n": i}))
                .await
                .unwrap();
        }
        store.put(ItemScope::project(5), "loose", &json!({"even": true})).await.unwrap();

        let in_table = store.query(ItemScope::table(5, table.id), &ItemFilter::all()).await.unwrap();
        assert_eq!(in_table.len(), 4);
        assert_eq!(in_table[0].id, "row0");

        let even = store
            .query(ItemScope::table(5, table.id), &ItemFilter::field_eq("even", true))
            .await
            .unwrap();
        assert_eq!(even.len(), 2);

        let limited = store
            .query(ItemScope::project(5), &ItemFilter::field_eq("even", true).with_limit(1))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_create_and_list_tables() {
        let store = test_store().await;
        let schema = TableSchema::new(vec![FieldDefinition::new("name", "Name", FieldType::Text)]);

        let created = store
            .create_table(9, "cities", &schema, Some("Cities"))
            .await
            .unwrap();
        store.create_table(10, "other", &schema, None).await.unwrap();

        let tables = store.list_tables(9).await.unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].id, created.id);
        assert_eq!(tables[0].name, "cities");
        assert_eq!(tables[0].description.as_deref(), Some("Cities"));
        assert_eq!(tables[0].schema, schema);
    }

    #[tokio::test]
    async fn test_create_table_rejects_invalid_schema() {
        let store = test_store().await;
        let result = store
            .create_table(1, "empty", &TableSchema::default(), None)
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(store.list_tables(1).await.unwrap().is_empty());
    }
}
