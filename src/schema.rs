//! Schema Introspector
//!
//! A serializable snapshot of the current database, used by editor
//! autocomplete and the schema explorer. Always built from live catalog
//! state; nothing is cached between calls.

use crate::catalog::{Catalog, Table};
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSnapshot {
    pub current_database: String,
    pub available_databases: Vec<String>,
    pub tables: Vec<TableSchema>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub key_role: Option<KeyRole>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyRole {
    #[serde(rename = "PK")]
    PrimaryKey,
}

impl TableSchema {
    fn from_table(table: &Table) -> Self {
        TableSchema {
            name: table.name.clone(),
            columns: table
                .columns
                .iter()
                .map(|c| ColumnSchema {
                    name: c.name.clone(),
                    data_type: c.data_type.name().to_string(),
                    key_role: c.primary_key.then_some(KeyRole::PrimaryKey),
                })
                .collect(),
        }
    }
}

impl SchemaSnapshot {
    pub fn capture(catalog: &Catalog, current_database: &str) -> Result<Self> {
        let database = catalog.get_database(current_database)?;
        Ok(SchemaSnapshot {
            current_database: database.name.clone(),
            available_databases: catalog.database_names(),
            tables: database.tables().iter().map(TableSchema::from_table).collect(),
        })
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }
}
