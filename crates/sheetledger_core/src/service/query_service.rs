//! Table read use-case.
//!
//! # Responsibility
//! - Load a table, detect its header and extract active/history records.
//! - Classify unusable tables into outcomes instead of errors.
//!
//! # Invariants
//! - A missing table, an empty table or an unrecognized header produce an
//!   empty `Extraction`, never a `StoreError`.
//! - Only backend failures surface as errors.

use crate::config::LedgerConfig;
use crate::model::record::Extraction;
use crate::schema::{RecordExtractor, SchemaDetector};
use crate::store::{SheetStore, StoreResult};
use log::{info, warn};

/// Why a query produced (or did not produce) records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Found { header_index: usize },
    TableNotFound(String),
    /// Fewer than two rows.
    Empty,
    NoHeader,
}

impl QueryOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// Caller-facing status line; empty for `Found`.
    pub fn message(&self) -> String {
        match self {
            Self::Found { .. } => String::new(),
            Self::TableNotFound(table) => format!("table not found: {table}"),
            Self::Empty => "table is empty".to_string(),
            Self::NoHeader => "no recognizable header row".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    pub outcome: QueryOutcome,
    pub extraction: Extraction,
}

impl TableQuery {
    fn without_records(outcome: QueryOutcome) -> Self {
        Self {
            outcome,
            extraction: Extraction::default(),
        }
    }
}

/// Read path over a `SheetStore`.
pub struct RecordQueryService<S: SheetStore> {
    store: S,
    detector: SchemaDetector,
    extractor: RecordExtractor,
}

impl<S: SheetStore> RecordQueryService<S> {
    pub fn new(store: S, config: &LedgerConfig) -> Self {
        Self::with_parts(
            store,
            SchemaDetector::default(),
            RecordExtractor::new(&config.history_sentinel),
        )
    }

    pub fn with_parts(store: S, detector: SchemaDetector, extractor: RecordExtractor) -> Self {
        Self {
            store,
            detector,
            extractor,
        }
    }

    /// Reads `table` into active and history records.
    pub fn query_records(&self, table: &str) -> StoreResult<TableQuery> {
        let Some(rows) = self.store.get_rows(table)? else {
            warn!("event=table_query module=query status=not_found table={table}");
            return Ok(TableQuery::without_records(QueryOutcome::TableNotFound(
                table.to_string(),
            )));
        };
        if rows.len() < 2 {
            return Ok(TableQuery::without_records(QueryOutcome::Empty));
        }
        let Some(header_index) = self.detector.detect(&rows) else {
            warn!(
                "event=table_query module=query status=no_header table={table} rows={}",
                rows.len()
            );
            return Ok(TableQuery::without_records(QueryOutcome::NoHeader));
        };

        let extraction = self.extractor.extract(&rows, header_index);
        info!(
            "event=table_query module=query status=ok table={table} header_row={header_index} active={} history={}",
            extraction.active.len(),
            extraction.history.len()
        );
        Ok(TableQuery {
            outcome: QueryOutcome::Found { header_index },
            extraction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryOutcome, RecordQueryService};
    use crate::config::LedgerConfig;
    use crate::store::{MemorySheetStore, StoreError};

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn missing_table_reports_not_found() {
        let store = MemorySheetStore::new();
        let service = RecordQueryService::new(&store, &LedgerConfig::default());

        let query = service.query_records("NOPE").unwrap();
        assert_eq!(query.outcome.message(), "table not found: NOPE");
        assert!(query.extraction.is_empty());
    }

    #[test]
    fn header_only_table_is_empty() {
        let store = MemorySheetStore::with_tables([("T", rows(&[&["FOLIO", "CONCEPTO"]]))]);
        let service = RecordQueryService::new(&store, &LedgerConfig::default());

        let query = service.query_records("T").unwrap();
        assert_eq!(query.outcome, QueryOutcome::Empty);
        assert_eq!(query.outcome.message(), "table is empty");
    }

    #[test]
    fn unknown_layout_reports_no_header() {
        let store = MemorySheetStore::with_tables([("T", rows(&[&["a", "b"], &["c", "d"]]))]);
        let service = RecordQueryService::new(&store, &LedgerConfig::default());

        let query = service.query_records("T").unwrap();
        assert_eq!(query.outcome, QueryOutcome::NoHeader);
        assert!(query.extraction.active.is_empty());
        assert!(query.extraction.history.is_empty());
    }

    #[test]
    fn found_table_splits_active_and_history() {
        let store = MemorySheetStore::with_tables([(
            "T",
            rows(&[
                &["Reporte"],
                &["ID", "RESPONSABLE"],
                &["1", "Ana"],
                &["TAREAS REALIZADAS"],
                &["2", "Luis"],
            ]),
        )]);
        let service = RecordQueryService::new(&store, &LedgerConfig::default());

        let query = service.query_records("T").unwrap();
        assert_eq!(query.outcome, QueryOutcome::Found { header_index: 1 });
        assert_eq!(query.extraction.active.len(), 1);
        assert_eq!(query.extraction.history.len(), 1);
        assert_eq!(query.extraction.history[0].get("RESPONSABLE"), Some("Luis"));
    }

    #[test]
    fn backend_outage_is_an_error() {
        let store = MemorySheetStore::new();
        store.set_unavailable(true);
        let service = RecordQueryService::new(&store, &LedgerConfig::default());

        let err = service.query_records("T").unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
