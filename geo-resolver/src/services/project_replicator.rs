//! Project replication
//!
//! Copies resolved addresses into a project's reserved `_geocodes` table as
//! independent records the user may edit. Copies get fresh random ids, so
//! edits never reach the shared cache.

use geo_common::{
    FieldDefinition, FieldType, ItemFilter, ItemScope, ItemStore, TableRegistry, TableSchema,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use super::batch_geocoder::BatchGeocoder;
use crate::error::GeocodeError;
use crate::models::{GeocodeResults, ProjectGeoRecord, ReplicationSummary};

/// Reserved table name; the underscore keeps it apart from user tables
pub const LOCAL_GEO_TABLE_NAME: &str = "_geocodes";

pub const LOCAL_GEO_TABLE_DESCRIPTION: &str = "Project-local geocoding results";

/// Fixed field layout of the local geo table
pub fn local_geo_schema() -> TableSchema {
    TableSchema::new(vec![
        FieldDefinition::new("address", "Address", FieldType::Text).primary(),
        FieldDefinition::new("lat", "Latitude", FieldType::Number { precision: Some(6) }),
        FieldDefinition::new("lng", "Longitude", FieldType::Number { precision: Some(6) }),
        FieldDefinition::new("confidence", "Confidence", FieldType::Number { precision: Some(2) }),
        FieldDefinition::new("source", "Source", FieldType::Text).read_only(),
        FieldDefinition::new("display_name", "Display Name", FieldType::Text),
        FieldDefinition::new("is_custom", "Custom", FieldType::Boolean),
    ])
}

fn local_record_id(project_id: i64) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("geocode_local_{}_{}", project_id, &random[..16])
}

/// Creates project geo tables and fills them from batch results
pub struct ProjectReplicator {
    geocoder: Arc<BatchGeocoder>,
    store: Arc<dyn ItemStore>,
    registry: Arc<dyn TableRegistry>,
    // Serializes look-up-then-create so one process never creates two tables
    table_guard: Mutex<()>,
}

impl ProjectReplicator {
    pub fn new(
        geocoder: Arc<BatchGeocoder>,
        store: Arc<dyn ItemStore>,
        registry: Arc<dyn TableRegistry>,
    ) -> Self {
        Self {
            geocoder,
            store,
            registry,
            table_guard: Mutex::new(()),
        }
    }

    /// Id of the project's local geo table, if it has been created
    pub async fn find_local_table(&self, project_id: i64) -> Result<Option<i64>, GeocodeError> {
        let tables = self.registry.list_tables(project_id).await?;
        Ok(tables
            .into_iter()
            .find(|t| t.name == LOCAL_GEO_TABLE_NAME)
            .map(|t| t.id))
    }

    /// Return the project's local geo table id, creating the table on first use
    pub async fn ensure_local_table(&self, project_id: i64) -> Result<i64, GeocodeError> {
        let _guard = self.table_guard.lock().await;

        if let Some(table_id) = self.find_local_table(project_id).await? {
            return Ok(table_id);
        }

        let table = self
            .registry
            .create_table(
                project_id,
                LOCAL_GEO_TABLE_NAME,
                &local_geo_schema(),
                Some(LOCAL_GEO_TABLE_DESCRIPTION),
            )
            .await
            .map_err(|source| GeocodeError::TableCreation { project_id, source })?;

        info!(project_id, table_id = table.id, "Created local geo table");
        Ok(table.id)
    }

    /// Write one fresh record per resolved address; unresolved ones are skipped
    pub async fn copy_results(
        &self,
        results: &GeocodeResults,
        project_id: i64,
        table_id: i64,
    ) -> Result<usize, GeocodeError> {
        let scope = ItemScope::table(project_id, table_id);
        let mut copied = 0;

        for (address, result) in results.iter() {
            let Some(result) = result else {
                continue;
            };

            let record = ProjectGeoRecord {
                id: local_record_id(project_id),
                address: address.to_string(),
                lat: result.lat,
                lng: result.lng,
                confidence: result.confidence,
                source: result.source.clone(),
                display_name: result.display_name.clone(),
                is_custom: false,
            };

            let payload = serde_json::to_value(&record).map_err(geo_common::Error::from)?;
            self.store.put(scope, &record.id, &payload).await?;
            copied += 1;
        }

        if copied > 0 {
            info!(project_id, table_id, copied, "Copied geocode results to project");
        }

        Ok(copied)
    }

    /// Geocode through the shared cache, then copy results into the project
    ///
    /// `field_name` names the caller's address column; it is echoed back but
    /// does not influence resolution or storage.
    pub async fn geocode_and_copy(
        &self,
        addresses: &[String],
        project_id: i64,
        field_name: &str,
    ) -> Result<ReplicationSummary, GeocodeError> {
        info!(
            project_id,
            field_name = %field_name,
            count = addresses.len(),
            "Geocoding addresses for project"
        );

        let outcome = self.geocoder.geocode_batch(addresses).await;
        let local_table_id = self.ensure_local_table(project_id).await?;
        let copied_count = self
            .copy_results(&outcome.results, project_id, local_table_id)
            .await?;

        Ok(ReplicationSummary {
            results: outcome.results,
            cached_count: outcome.cached_count,
            new_count: outcome.new_count,
            copied_count,
            failed: outcome.failed,
            local_table_id,
            field_name: field_name.to_string(),
        })
    }

    /// Records in the project's local geo table (empty if it does not exist)
    pub async fn list_local_records(
        &self,
        project_id: i64,
    ) -> Result<Vec<ProjectGeoRecord>, GeocodeError> {
        let Some(table_id) = self.find_local_table(project_id).await? else {
            return Ok(Vec::new());
        };

        let items = self
            .store
            .query(ItemScope::table(project_id, table_id), &ItemFilter::all())
            .await?;

        items
            .into_iter()
            .map(|item| {
                serde_json::from_value(item.data)
                    .map_err(|e| GeocodeError::Store(geo_common::Error::from(e)))
            })
            .collect()
    }
}
