//! In-memory `SheetStore` double.
//!
//! Used by tests and offline tooling. Supports fault injection so write
//! paths can be exercised against partial failures.

use super::{SheetStore, StoreError, StoreResult};
use crate::model::record::Row;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    tables: BTreeMap<String, Vec<Row>>,
    /// Remaining injected append failures per table.
    append_faults: HashMap<String, usize>,
    unavailable: bool,
}

/// Thread-safe in-memory table store.
#[derive(Default)]
pub struct MemorySheetStore {
    state: Mutex<MemoryState>,
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with `(table, rows)` pairs.
    pub fn with_tables<I, N>(tables: I) -> Self
    where
        I: IntoIterator<Item = (N, Vec<Row>)>,
        N: Into<String>,
    {
        let store = Self::new();
        if let Ok(mut state) = store.state.lock() {
            for (name, rows) in tables {
                state.tables.insert(name.into(), rows);
            }
        }
        store
    }

    /// Makes the next `times` appends to `table` fail with `Unavailable`.
    pub fn fail_appends(&self, table: &str, times: usize) {
        if let Ok(mut state) = self.state.lock() {
            state.append_faults.insert(table.to_string(), times);
        }
    }

    /// Toggles a simulated backend outage for every call.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.unavailable = unavailable;
        }
    }

    /// Returns sorted table names.
    pub fn table_names(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.tables.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the row count of `table`, `0` when absent.
    pub fn row_count(&self, table: &str) -> usize {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.tables.get(table).map(Vec::len))
            .unwrap_or(0)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        let state = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        if state.unavailable {
            return Err(StoreError::Unavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(state)
    }
}

impl SheetStore for MemorySheetStore {
    fn get_rows(&self, table: &str) -> StoreResult<Option<Vec<Row>>> {
        Ok(self.lock()?.tables.get(table).cloned())
    }

    fn append_row(&self, table: &str, row: &[String]) -> StoreResult<()> {
        let mut state = self.lock()?;
        if let Some(remaining) = state.append_faults.get_mut(table) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StoreError::Unavailable(format!(
                    "injected append failure on `{table}`"
                )));
            }
        }
        match state.tables.get_mut(table) {
            Some(rows) => {
                rows.push(row.to_vec());
                Ok(())
            }
            None => Err(StoreError::TableNotFound(table.to_string())),
        }
    }

    fn create_table(&self, table: &str, _rows: usize, _cols: usize) -> StoreResult<()> {
        self.lock()?.tables.entry(table.to_string()).or_default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemorySheetStore;
    use crate::store::{SheetStore, StoreError};

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn absent_table_reads_as_none_and_rejects_append() {
        let store = MemorySheetStore::new();
        assert!(store.get_rows("MISSING").unwrap().is_none());
        let err = store.append_row("MISSING", &row(&["x"])).unwrap_err();
        assert!(matches!(err, StoreError::TableNotFound(name) if name == "MISSING"));
    }

    #[test]
    fn injected_faults_are_consumed_in_order() {
        let store = MemorySheetStore::with_tables([("T", Vec::new())]);
        store.fail_appends("T", 1);

        assert!(store.append_row("T", &row(&["a"])).is_err());
        store.append_row("T", &row(&["b"])).unwrap();
        assert_eq!(store.get_rows("T").unwrap().unwrap(), vec![row(&["b"])]);
    }

    #[test]
    fn unavailable_store_fails_every_call() {
        let store = MemorySheetStore::with_tables([("T", Vec::new())]);
        store.set_unavailable(true);
        assert!(matches!(
            store.get_rows("T").unwrap_err(),
            StoreError::Unavailable(_)
        ));
    }
}
