//! # Catalog
//!
//! Row shapes of the `information_schema` views the generator consumes, the
//! [`CatalogReader`] seam that produces them, and the conversion of raw rows into
//! [`ColumnDescriptor`]s.
//!
//! Two readers ship with the crate:
//!
//! - [`SnapshotCatalog`] reads every table from a JSON/YAML/TOML snapshot file
//! - `MysqlCatalog` (cargo feature `mysql`) queries a live server over one lazily opened
//!   connection that is reused for every table and closed by [`CatalogReader::close`]
//!
//! Index groupings used by the beego dialect are returned with each table
//! ([`TableMetadata::indexes`]) rather than accumulated across tables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::annotation::extract_annotation;
use crate::naming::to_exported_name;

#[cfg(feature = "mysql")]
mod mysql;
mod snapshot;

#[cfg(feature = "mysql")]
pub use mysql::MysqlCatalog;
pub use snapshot::{SnapshotCatalog, SnapshotTable};

/// Name of the primary key index, which never takes part in index processing.
pub const PRIMARY_INDEX: &str = "PRIMARY";

/// One row of `INFORMATION_SCHEMA.COLUMNS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnRow {
    pub name: String,
    pub ordinal: u32,
    pub default: Option<String>,
    /// `YES` or `NO`.
    pub nullable: String,
    pub data_type: String,
    pub char_max_length: Option<i64>,
    pub numeric_precision: Option<i64>,
    pub numeric_scale: Option<i64>,
    pub column_type: String,
    pub column_key: String,
    pub extra: String,
    pub comment: String,
}

/// One row of `INFORMATION_SCHEMA.STATISTICS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexRow {
    pub non_unique: i64,
    pub index_name: String,
    pub seq_in_index: i64,
    pub column_name: String,
    pub index_comment: String,
}

/// Source of catalog rows.
pub trait CatalogReader {
    /// Comment of a table; empty when the table has none.
    fn table_comment(&mut self, table: &str) -> anyhow::Result<String>;

    /// Column rows of a table in ordinal order.
    fn columns(&mut self, table: &str) -> anyhow::Result<Vec<ColumnRow>>;

    /// Index rows of a table ordered by index name and sequence.
    fn indexes(&mut self, table: &str) -> anyhow::Result<Vec<IndexRow>>;

    /// Release the underlying connection, if any.
    fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// An index a column belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescriptor {
    pub name: String,
    pub sequence: i64,
    pub unique: bool,
    pub comment: String,
}

impl IndexDescriptor {
    pub fn from_row(row: &IndexRow) -> Self {
        Self {
            name: row.index_name.clone(),
            sequence: row.seq_in_index,
            unique: row.non_unique == 0,
            comment: row.index_comment.clone(),
        }
    }
}

/// A catalog column with its derived flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub ordinal: u32,
    /// Data type keyword (`bigint`).
    pub data_type: String,
    /// Full column type (`bigint(20) unsigned`).
    pub column_type: String,
    pub nullable: bool,
    /// Trimmed default; empty when the column has none.
    pub default: String,
    pub length: i64,
    pub precision: i64,
    pub scale: i64,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unsigned: bool,
    pub comment: String,
    /// Non-unique indexes containing this column.
    pub indexes: Vec<IndexDescriptor>,
    pub unique_indexes: Vec<IndexDescriptor>,
}

impl ColumnDescriptor {
    /// Build a descriptor and attach the column's non-primary indexes.
    pub fn from_row(row: &ColumnRow, index_rows: &[IndexRow]) -> Self {
        let (unique_indexes, indexes): (Vec<_>, Vec<_>) = index_rows
            .iter()
            .filter(|r| r.index_name != PRIMARY_INDEX && r.column_name == row.name)
            .map(IndexDescriptor::from_row)
            .partition(|i| i.unique);

        Self {
            name: row.name.clone(),
            ordinal: row.ordinal,
            data_type: row.data_type.clone(),
            column_type: row.column_type.clone(),
            nullable: row.nullable.eq_ignore_ascii_case("YES"),
            default: row.default.as_deref().unwrap_or_default().trim().to_string(),
            length: row.char_max_length.unwrap_or_default(),
            precision: row.numeric_precision.unwrap_or_default(),
            scale: row.numeric_scale.unwrap_or_default(),
            primary_key: row.column_key == "PRI",
            auto_increment: row.extra.contains("auto_increment"),
            unsigned: row.column_type.contains("unsigned"),
            comment: row.comment.trim().to_string(),
            indexes,
            unique_indexes,
        }
    }

    /// A display-width-1 tinyint whose comment carries no enum set or exactly `0 1`.
    pub fn is_bool_column(&self) -> bool {
        if !self.column_type.contains("tinyint(1)") {
            return false;
        }
        let annotation = extract_annotation(&self.comment);
        !annotation.has_enums() || annotation.is_bool_enum()
    }
}

/// Table-level index groupings: each entry lists the quoted exported column names of
/// one index joined by `,`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableIndexes {
    pub normal: Vec<String>,
    pub unique: Vec<String>,
}

impl TableIndexes {
    /// Group index rows by index name (sorted), dropping duplicate groupings.
    ///
    /// Columns inside a grouping follow `seq_in_index`, whatever the row order.
    pub fn from_rows(rows: &[IndexRow], enable_initialism: bool) -> Self {
        let mut normal: BTreeMap<&str, Vec<(i64, String)>> = BTreeMap::new();
        let mut unique: BTreeMap<&str, Vec<(i64, String)>> = BTreeMap::new();
        for row in rows.iter().filter(|r| r.index_name != PRIMARY_INDEX) {
            let column = format!("{:?}", to_exported_name(&row.column_name, enable_initialism));
            let target = if row.non_unique == 0 { &mut unique } else { &mut normal };
            target
                .entry(row.index_name.as_str())
                .or_default()
                .push((row.seq_in_index, column));
        }
        let join = |mut columns: Vec<(i64, String)>| {
            columns.sort_by_key(|(seq, _)| *seq);
            columns.into_iter().map(|(_, c)| c).collect::<Vec<_>>().join(",")
        };
        Self {
            normal: unique_strings(normal.into_values().map(join)),
            unique: unique_strings(unique.into_values().map(join)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normal.is_empty() && self.unique.is_empty()
    }
}

/// Keep the first occurrence of every string.
pub fn unique_strings(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// Everything the generator needs to know about one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableMetadata {
    pub name: String,
    pub comment: String,
    pub columns: Vec<ColumnDescriptor>,
    pub indexes: TableIndexes,
}

/// Read one table through a catalog reader.
pub fn read_table(
    reader: &mut dyn CatalogReader,
    table: &str,
    enable_initialism: bool,
) -> anyhow::Result<TableMetadata> {
    use anyhow::Context;

    let comment = reader
        .table_comment(table)
        .with_context(|| format!("Failed to read comment of table `{table}`"))?;
    let index_rows = reader
        .indexes(table)
        .with_context(|| format!("Failed to read indexes of table `{table}`"))?;
    let mut rows = reader
        .columns(table)
        .with_context(|| format!("Failed to read columns of table `{table}`"))?;
    rows.sort_by_key(|r| r.ordinal);

    let columns = rows
        .iter()
        .map(|row| ColumnDescriptor::from_row(row, &index_rows))
        .collect::<Vec<_>>();
    tracing::debug!(table, columns = columns.len(), indexes = index_rows.len(), "read table");

    Ok(TableMetadata {
        name: table.to_string(),
        comment: comment.trim().to_string(),
        columns,
        indexes: TableIndexes::from_rows(&index_rows, enable_initialism),
    })
}
