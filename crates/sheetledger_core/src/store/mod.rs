//! Tabular backend contract and implementations.
//!
//! # Responsibility
//! - Define `SheetStore`, the only storage surface the core reads and writes.
//! - Provide an in-memory double and a SQLite-backed implementation.
//!
//! # Invariants
//! - `get_rows` returns `None` for an absent table, never an error.
//! - `append_row` on an absent table fails with `TableNotFound`; callers
//!   create tables through `ensure_table` first.
//! - Rows are returned in append order.

use crate::db::DbError;
use crate::model::record::Row;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod memory;
pub mod sqlite;

pub use memory::MemorySheetStore;
pub use sqlite::SqliteSheetStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-layer failure.
#[derive(Debug)]
pub enum StoreError {
    /// Backend cannot be reached or refused the call.
    Unavailable(String),
    /// Append targeted a table that does not exist.
    TableNotFound(String),
    Db(DbError),
    /// Persisted row content cannot be decoded.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
            Self::TableNotFound(table) => write!(f, "table not found: {table}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored row: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Spreadsheet-like backend: named tables of string rows.
pub trait SheetStore {
    /// Returns every row of `table`, or `None` when the table is absent.
    fn get_rows(&self, table: &str) -> StoreResult<Option<Vec<Row>>>;
    /// Appends one row at the end of `table`.
    fn append_row(&self, table: &str, row: &[String]) -> StoreResult<()>;
    /// Creates an empty table; no-op when it already exists.
    fn create_table(&self, table: &str, rows: usize, cols: usize) -> StoreResult<()>;
}

impl<T: SheetStore + ?Sized> SheetStore for &T {
    fn get_rows(&self, table: &str) -> StoreResult<Option<Vec<Row>>> {
        (**self).get_rows(table)
    }

    fn append_row(&self, table: &str, row: &[String]) -> StoreResult<()> {
        (**self).append_row(table, row)
    }

    fn create_table(&self, table: &str, rows: usize, cols: usize) -> StoreResult<()> {
        (**self).create_table(table, rows, cols)
    }
}

impl<T: SheetStore + ?Sized> SheetStore for Arc<T> {
    fn get_rows(&self, table: &str) -> StoreResult<Option<Vec<Row>>> {
        (**self).get_rows(table)
    }

    fn append_row(&self, table: &str, row: &[String]) -> StoreResult<()> {
        (**self).append_row(table, row)
    }

    fn create_table(&self, table: &str, rows: usize, cols: usize) -> StoreResult<()> {
        (**self).create_table(table, rows, cols)
    }
}

/// Dimensions requested when a write path creates a new table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDims {
    pub rows: usize,
    pub cols: usize,
}

impl Default for TableDims {
    fn default() -> Self {
        Self {
            rows: 1000,
            cols: 26,
        }
    }
}

/// Makes sure `table` exists and starts with a header row.
///
/// Creates the table when absent and appends `headers` when it has no rows.
/// Returns `true` when a header row was written.
pub fn ensure_table<S: SheetStore + ?Sized>(
    store: &S,
    table: &str,
    headers: &[String],
    dims: TableDims,
) -> StoreResult<bool> {
    let rows = match store.get_rows(table)? {
        Some(rows) => rows,
        None => {
            store.create_table(table, dims.rows, dims.cols)?;
            Vec::new()
        }
    };
    if !rows.is_empty() {
        return Ok(false);
    }
    store.append_row(table, headers)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::{ensure_table, MemorySheetStore, SheetStore, TableDims};

    #[test]
    fn ensure_table_creates_and_writes_header_once() {
        let store = MemorySheetStore::new();
        let headers = vec!["FOLIO".to_string(), "TOTAL".to_string()];

        assert!(ensure_table(&store, "DB_X", &headers, TableDims::default()).unwrap());
        assert!(!ensure_table(&store, "DB_X", &headers, TableDims::default()).unwrap());

        let rows = store.get_rows("DB_X").unwrap().unwrap();
        assert_eq!(rows, vec![headers]);
    }
}
