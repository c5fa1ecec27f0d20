//! Table field schemas
//!
//! Field types form a closed set. Every consumer that interprets a field
//! matches on [`FieldType`] exhaustively, so adding a variant is a compile
//! error at each boundary rather than a silently ignored string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{Error, Result};

/// Largest decimal precision a number field may request
pub const MAX_NUMBER_PRECISION: u8 = 15;

/// One choice of a select / multi-select field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Field type with its type-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    Text,
    RichText,
    Number {
        /// Decimal places shown to the user
        #[serde(default, skip_serializing_if = "Option::is_none")]
        precision: Option<u8>,
    },
    Boolean,
    Date,
    GeoPoint,
    Url,
    Json,
    Select {
        options: Vec<SelectOption>,
    },
    MultiSelect {
        options: Vec<SelectOption>,
    },
}

impl FieldType {
    /// Wire name of the type tag
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::RichText => "rich_text",
            FieldType::Number { .. } => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::GeoPoint => "geo_point",
            FieldType::Url => "url",
            FieldType::Json => "json",
            FieldType::Select { .. } => "select",
            FieldType::MultiSelect { .. } => "multi_select",
        }
    }

    /// Check type-specific configuration for the field named `key`
    pub fn validate(&self, key: &str) -> Result<()> {
        match self {
            FieldType::Text
            | FieldType::RichText
            | FieldType::Boolean
            | FieldType::Date
            | FieldType::GeoPoint
            | FieldType::Url
            | FieldType::Json => Ok(()),
            FieldType::Number { precision } => match precision {
                Some(p) if *p > MAX_NUMBER_PRECISION => Err(Error::InvalidInput(format!(
                    "field '{}': precision {} exceeds {}",
                    key, p, MAX_NUMBER_PRECISION
                ))),
                _ => Ok(()),
            },
            FieldType::Select { options } | FieldType::MultiSelect { options } => {
                if options.is_empty() {
                    return Err(Error::InvalidInput(format!(
                        "field '{}': {} requires at least one option",
                        key,
                        self.as_str()
                    )));
                }
                let mut seen = HashSet::new();
                for option in options {
                    if !seen.insert(option.id.as_str()) {
                        return Err(Error::InvalidInput(format!(
                            "field '{}': duplicate option id '{}'",
                            key, option.id
                        )));
                    }
                }
                Ok(())
            }
        }
    }
}

/// A single column of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Storage key inside the item payload
    pub key: String,
    /// Column name shown to users
    pub label: String,
    #[serde(flatten)]
    pub field_type: FieldType,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub read_only: bool,
}

impl FieldDefinition {
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            is_primary: false,
            read_only: false,
        }
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Ordered field list of a table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub fields: Vec<FieldDefinition>,
}

impl TableSchema {
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        Self { fields }
    }

    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Reject empty schemas, blank or duplicate keys and bad type configs
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(Error::InvalidInput("schema has no fields".to_string()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.key.trim().is_empty() {
                return Err(Error::InvalidInput("field key must not be empty".to_string()));
            }
            if !seen.insert(field.key.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "duplicate field key '{}'",
                    field.key
                )));
            }
            field.field_type.validate(&field.key)?;
        }

        Ok(())
    }
}

/// A registered table belonging to a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub schema: TableSchema,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(id: &str) -> SelectOption {
        SelectOption {
            id: id.to_string(),
            label: id.to_uppercase(),
            color: None,
        }
    }

    #[test]
    fn test_field_type_tag_is_flattened() {
        let field = FieldDefinition::new("lat", "Latitude", FieldType::Number { precision: Some(6) });
        let json = serde_json::to_value(&field).unwrap();

        assert_eq!(json["key"], "lat");
        assert_eq!(json["type"], "number");
        assert_eq!(json["precision"], 6);

        let parsed: FieldDefinition = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, field);
    }

    #[test]
    fn test_unknown_field_type_is_rejected() {
        let json = serde_json::json!({"key": "x", "label": "X", "type": "hologram"});
        assert!(serde_json::from_value::<FieldDefinition>(json).is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_keys() {
        let schema = TableSchema::new(vec![
            FieldDefinition::new("address", "Address", FieldType::Text),
            FieldDefinition::new("address", "Address again", FieldType::Text),
        ]);
        assert!(matches!(schema.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_empty_select() {
        let schema = TableSchema::new(vec![FieldDefinition::new(
            "kind",
            "Kind",
            FieldType::Select { options: vec![] },
        )]);
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_option_ids() {
        let schema = TableSchema::new(vec![FieldDefinition::new(
            "tags",
            "Tags",
            FieldType::MultiSelect {
                options: vec![option("a"), option("a")],
            },
        )]);
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_mixed_schema() {
        let schema = TableSchema::new(vec![
            FieldDefinition::new("name", "Name", FieldType::Text).primary(),
            FieldDefinition::new("where", "Where", FieldType::GeoPoint),
            FieldDefinition::new("kind", "Kind", FieldType::Select { options: vec![option("a"), option("b")] }),
            FieldDefinition::new("score", "Score", FieldType::Number { precision: Some(2) }).read_only(),
        ]);
        assert!(schema.validate().is_ok());
        assert!(schema.field("where").is_some());
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn test_validate_rejects_excessive_precision() {
        let schema = TableSchema::new(vec![FieldDefinition::new(
            "n",
            "N",
            FieldType::Number { precision: Some(MAX_NUMBER_PRECISION + 1) },
        )]);
        assert!(schema.validate().is_err());
    }
}
