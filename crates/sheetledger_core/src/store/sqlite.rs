//! SQLite-backed `SheetStore`.
//!
//! # Responsibility
//! - Persist named tables and their rows inside the core database.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - Rows are numbered per table starting at 1 and read back in that order.
//! - Cells are stored as a JSON array of strings.

use super::{SheetStore, StoreError, StoreResult};
use crate::db::migrations::require_current;
use crate::db::DbError;
use crate::model::record::Row;
use rusqlite::{params, Connection, OptionalExtension};

/// SQLite table store borrowing an opened, migrated connection.
pub struct SqliteSheetStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSheetStore<'conn> {
    /// Wraps a connection after checking the schema is fully migrated.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        match require_current(conn) {
            Ok(()) => {}
            Err(err @ DbError::SchemaBehind { .. }) => {
                return Err(StoreError::Unavailable(err.to_string()))
            }
            Err(err) => return Err(err.into()),
        }
        Ok(Self { conn })
    }

    fn table_exists(&self, table: &str) -> StoreResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sheet_tables WHERE name = ?1;",
                [table],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

impl SheetStore for SqliteSheetStore<'_> {
    fn get_rows(&self, table: &str) -> StoreResult<Option<Vec<Row>>> {
        if !self.table_exists(table)? {
            return Ok(None);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT cells FROM sheet_rows WHERE table_name = ?1 ORDER BY row_no ASC;")?;
        let mut rows = stmt.query([table])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let cells_text: String = row.get(0)?;
            let cells: Row = serde_json::from_str(&cells_text).map_err(|err| {
                StoreError::InvalidData(format!("table `{table}` has undecodable cells: {err}"))
            })?;
            out.push(cells);
        }
        Ok(Some(out))
    }

    fn append_row(&self, table: &str, row: &[String]) -> StoreResult<()> {
        if !self.table_exists(table)? {
            return Err(StoreError::TableNotFound(table.to_string()));
        }

        let cells = serde_json::to_string(row)
            .map_err(|err| StoreError::InvalidData(format!("row cannot be encoded: {err}")))?;
        self.conn.execute(
            "INSERT INTO sheet_rows (table_name, row_no, cells)
             SELECT ?1, COALESCE(MAX(row_no), 0) + 1, ?2
             FROM sheet_rows
             WHERE table_name = ?1;",
            params![table, cells],
        )?;
        Ok(())
    }

    fn create_table(&self, table: &str, rows: usize, cols: usize) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO sheet_tables (name, row_capacity, col_capacity)
             VALUES (?1, ?2, ?3);",
            params![table, to_db_size(rows), to_db_size(cols)],
        )?;
        Ok(())
    }
}

fn to_db_size(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
