//! Database initialization
//!
//! Opens (creating if needed) the SQLite database and runs the idempotent
//! schema setup for the `data_tables` registry and the `items` store.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open the database at `db_path` and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL lets geocode reads proceed while a batch is writing results
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every table used by the store (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_data_tables_table(pool).await?;
    create_items_table(pool).await?;
    Ok(())
}

/// Table registry: one row per user or system table of a project
pub async fn create_data_tables_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS data_tables (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            schema TEXT NOT NULL DEFAULT '{"fields":[]}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_data_tables_project_name ON data_tables(project_id, name)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Item store: opaque JSON payloads keyed by (project, id)
pub async fn create_items_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            project_id INTEGER NOT NULL,
            id TEXT NOT NULL,
            table_id INTEGER REFERENCES data_tables(id) ON DELETE CASCADE,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (project_id, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_table ON items(project_id, table_id)")
        .execute(pool)
        .await?;

    Ok(())
}
