//! Live catalog over a MySQL connection.

use anyhow::Context;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, OptsBuilder};
use tokio::runtime::Runtime;

use super::{CatalogReader, ColumnRow, IndexRow};
use crate::config::DbConfig;

const COLUMNS_SQL: &str = "SELECT COLUMN_NAME, ORDINAL_POSITION, COLUMN_DEFAULT, IS_NULLABLE, \
     DATA_TYPE, CHARACTER_MAXIMUM_LENGTH, NUMERIC_PRECISION, NUMERIC_SCALE, \
     COLUMN_TYPE, COLUMN_KEY, EXTRA, COLUMN_COMMENT \
     FROM INFORMATION_SCHEMA.COLUMNS \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
     ORDER BY ORDINAL_POSITION";

const INDEXES_SQL: &str = "SELECT NON_UNIQUE, INDEX_NAME, SEQ_IN_INDEX, COLUMN_NAME, INDEX_COMMENT \
     FROM INFORMATION_SCHEMA.STATISTICS \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
     ORDER BY INDEX_NAME, SEQ_IN_INDEX";

const TABLE_COMMENT_SQL: &str = "SELECT TABLE_COMMENT FROM INFORMATION_SCHEMA.TABLES \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?";

type ColumnTuple = (
    String,
    u32,
    Option<String>,
    String,
    String,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    String,
    String,
    String,
    String,
);

/// Catalog reader that queries `INFORMATION_SCHEMA` on a live server.
///
/// The connection is opened on the first query and reused until [`CatalogReader::close`].
/// Queries run on a private current-thread runtime, so callers stay synchronous.
pub struct MysqlCatalog {
    db: DbConfig,
    runtime: Runtime,
    conn: Option<Conn>,
}

impl MysqlCatalog {
    pub fn new(db: &DbConfig) -> anyhow::Result<Self> {
        db.check()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to build catalog runtime")?;
        Ok(Self {
            db: db.clone(),
            runtime,
            conn: None,
        })
    }

    fn opts(&self) -> OptsBuilder {
        OptsBuilder::default()
            .ip_or_hostname(self.db.host.clone())
            .tcp_port(self.db.port)
            .user(Some(self.db.user.clone()))
            .pass(Some(self.db.password.clone()))
            .db_name(Some(self.db.database.clone()))
    }

    /// Open the connection on first use and hand out the runtime alongside it.
    fn session(&mut self) -> anyhow::Result<(&Runtime, &mut Conn)> {
        if self.conn.is_none() {
            tracing::info!(host = %self.db.host, port = self.db.port, database = %self.db.database, "connecting to catalog");
            let conn = self
                .runtime
                .block_on(Conn::new(self.opts()))
                .with_context(|| format!("Failed to connect to {}:{}", self.db.host, self.db.port))?;
            self.conn = Some(conn);
        }
        let Self { runtime, conn, .. } = self;
        let conn = conn
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("catalog connection is not open"))?;
        Ok((runtime, conn))
    }

    fn params(&self, table: &str) -> (String, String) {
        (self.db.database.clone(), table.to_string())
    }
}

impl CatalogReader for MysqlCatalog {
    fn table_comment(&mut self, table: &str) -> anyhow::Result<String> {
        let params = self.params(table);
        let (runtime, conn) = self.session()?;
        let comment: Option<String> = runtime.block_on(conn.exec_first(TABLE_COMMENT_SQL, params))?;
        Ok(comment.unwrap_or_default())
    }

    fn columns(&mut self, table: &str) -> anyhow::Result<Vec<ColumnRow>> {
        let params = self.params(table);
        let (runtime, conn) = self.session()?;
        let rows: Vec<ColumnTuple> = runtime.block_on(conn.exec(COLUMNS_SQL, params))?;
        Ok(rows
            .into_iter()
            .map(
                |(name, ordinal, default, nullable, data_type, length, precision, scale, column_type, column_key, extra, comment)| {
                    ColumnRow {
                        name,
                        ordinal,
                        default,
                        nullable,
                        data_type,
                        char_max_length: length,
                        numeric_precision: precision,
                        numeric_scale: scale,
                        column_type,
                        column_key,
                        extra,
                        comment,
                    }
                },
            )
            .collect())
    }

    fn indexes(&mut self, table: &str) -> anyhow::Result<Vec<IndexRow>> {
        let params = self.params(table);
        let (runtime, conn) = self.session()?;
        let rows: Vec<(i64, String, i64, String, String)> = runtime.block_on(conn.exec(INDEXES_SQL, params))?;
        Ok(rows
            .into_iter()
            .map(|(non_unique, index_name, seq_in_index, column_name, index_comment)| IndexRow {
                non_unique,
                index_name,
                seq_in_index,
                column_name,
                index_comment,
            })
            .collect())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        if let Some(conn) = self.conn.take() {
            self.runtime
                .block_on(conn.disconnect())
                .context("Failed to close catalog connection")?;
            tracing::debug!("catalog connection closed");
        }
        Ok(())
    }
}
