//! Offline catalog backed by a snapshot file.
//!
//! ```yaml
//! tables:
//!   user:
//!     comment: 用户
//!     columns:
//!       - { name: id, ordinal: 1, nullable: "NO", data_type: bigint,
//!           column_type: "bigint(20) unsigned", column_key: PRI, extra: auto_increment,
//!           comment: 用户id }
//!     indexes: []
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::{CatalogReader, ColumnRow, IndexRow};
use crate::config::ConfigFormat;

/// One table of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotTable {
    pub comment: String,
    pub columns: Vec<ColumnRow>,
    pub indexes: Vec<IndexRow>,
}

/// Catalog rows captured ahead of time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotCatalog {
    pub tables: BTreeMap<String, SnapshotTable>,
}

impl SnapshotCatalog {
    /// Load a snapshot; the parser is chosen by extension like config files.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog snapshot: {}", path.display()))?;
        let catalog: Self = format
            .parse(&contents)
            .with_context(|| format!("Failed to parse catalog snapshot: {}", path.display()))?;
        tracing::info!(path = %path.display(), tables = catalog.tables.len(), "loaded catalog snapshot");
        Ok(catalog)
    }

    pub fn with_table(mut self, name: impl Into<String>, table: SnapshotTable) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    fn table(&self, name: &str) -> Option<&SnapshotTable> {
        let table = self.tables.get(name);
        if table.is_none() {
            tracing::warn!(table = name, "table not present in catalog snapshot");
        }
        table
    }
}

impl CatalogReader for SnapshotCatalog {
    fn table_comment(&mut self, table: &str) -> anyhow::Result<String> {
        Ok(self.table(table).map(|t| t.comment.clone()).unwrap_or_default())
    }

    fn columns(&mut self, table: &str) -> anyhow::Result<Vec<ColumnRow>> {
        Ok(self.table(table).map(|t| t.columns.clone()).unwrap_or_default())
    }

    fn indexes(&mut self, table: &str) -> anyhow::Result<Vec<IndexRow>> {
        Ok(self.table(table).map(|t| t.indexes.clone()).unwrap_or_default())
    }
}
