//! Flat child-table writer for nested line items.
//!
//! # Responsibility
//! - Project flattened line-item records onto a fixed header set.
//! - Append the projected rows to a child table, header first.
//!
//! # Invariants
//! - Column lookup tries the exact label, then the label with spaces
//!   replaced by underscores, then falls back to an empty cell.
//! - An empty item list never touches the store.

use crate::model::record::{Record, Row};
use crate::store::{ensure_table, SheetStore, StoreResult, TableDims};
use log::info;

/// Writes records to a child table one row at a time.
pub struct ChildTableWriter<S: SheetStore> {
    store: S,
    dims: TableDims,
}

impl<S: SheetStore> ChildTableWriter<S> {
    pub fn new(store: S) -> Self {
        Self::with_dims(store, TableDims::default())
    }

    pub fn with_dims(store: S, dims: TableDims) -> Self {
        Self { store, dims }
    }

    /// Projects `items` onto `headers` without writing anything.
    pub fn build_rows<H: AsRef<str>>(items: &[Record], headers: &[H]) -> Vec<Row> {
        items
            .iter()
            .map(|item| project_record(item, headers))
            .collect()
    }

    /// Appends `items` to `table`, creating it and its header row as needed.
    ///
    /// Returns the number of data rows appended. A failure partway through
    /// leaves the earlier rows in place.
    pub fn write<H: AsRef<str>>(
        &self,
        table: &str,
        items: &[Record],
        headers: &[H],
    ) -> StoreResult<usize> {
        if items.is_empty() {
            return Ok(0);
        }

        let header_row = headers
            .iter()
            .map(|label| label.as_ref().to_string())
            .collect::<Vec<_>>();
        ensure_table(&self.store, table, &header_row, self.dims)?;

        let rows = Self::build_rows(items, headers);
        for row in &rows {
            self.store.append_row(table, row)?;
        }
        info!(
            "event=child_write module=service status=ok table={table} rows={}",
            rows.len()
        );
        Ok(rows.len())
    }
}

/// Projects one record onto `headers`.
pub fn project_record<H: AsRef<str>>(record: &Record, headers: &[H]) -> Row {
    headers
        .iter()
        .map(|label| {
            let label = label.as_ref();
            record
                .get(label)
                .or_else(|| record.get(&label.replace(' ', "_")))
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::ChildTableWriter;
    use crate::model::record::Record;
    use crate::store::{MemorySheetStore, SheetStore};

    fn record(fields: &[(&str, &str)]) -> Record {
        fields.iter().copied().collect()
    }

    #[test]
    fn build_rows_falls_back_to_underscore_keys() {
        let items = vec![record(&[("FOLIO", "F-1"), ("ORDEN_COMPRA", "OC-9")])];
        let rows = ChildTableWriter::<MemorySheetStore>::build_rows(
            &items,
            &["FOLIO", "ORDEN COMPRA", "TOTAL"],
        );
        assert_eq!(rows, vec![vec!["F-1".to_string(), "OC-9".to_string(), String::new()]]);
    }

    #[test]
    fn write_creates_table_with_header_then_rows() {
        let store = MemorySheetStore::new();
        let writer = ChildTableWriter::new(&store);
        let items = vec![
            record(&[("FOLIO", "F-1"), ("TOTAL", "10")]),
            record(&[("FOLIO", "F-1"), ("TOTAL", "20")]),
        ];

        let written = writer.write("DB_X", &items, &["FOLIO", "TOTAL"]).unwrap();
        assert_eq!(written, 2);

        let rows = store.get_rows("DB_X").unwrap().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["FOLIO".to_string(), "TOTAL".to_string()]);
        assert_eq!(rows[2][1], "20");
    }

    #[test]
    fn existing_table_gets_no_second_header() {
        let store = MemorySheetStore::with_tables([(
            "DB_X",
            vec![vec!["FOLIO".to_string(), "TOTAL".to_string()]],
        )]);
        let writer = ChildTableWriter::new(&store);

        writer
            .write("DB_X", &[record(&[("FOLIO", "F-2")])], &["FOLIO", "TOTAL"])
            .unwrap();
        assert_eq!(store.row_count("DB_X"), 2);
    }

    #[test]
    fn empty_items_is_a_no_op() {
        let store = MemorySheetStore::new();
        let writer = ChildTableWriter::new(&store);

        let written = writer.write::<&str>("DB_X", &[], &["FOLIO"]).unwrap();
        assert_eq!(written, 0);
        assert!(store.get_rows("DB_X").unwrap().is_none());
    }
}
