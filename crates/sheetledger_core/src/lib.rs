//! Core domain logic for SheetLedger.
//! Heuristic read/write layer over schema-less, spreadsheet-like tables.

pub mod config;
pub mod db;
pub mod folio;
pub mod logging;
pub mod model;
pub mod schema;
pub mod sequence;
pub mod service;
pub mod store;

pub use config::{ChildTables, ConfigError, LedgerConfig};
pub use folio::{Clock, FixedClock, FolioGenerator, LocalClock};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogSink, LoggingError,
    LoggingStatus,
};
pub use model::directory::{DirectoryEntry, WorkMode, DEPARTMENTS};
pub use model::order::{parse_order_payload, LineCategory, LineItem, OrderItem, PayloadError};
pub use model::record::{Extraction, Record, Row};
pub use schema::{RecordExtractor, SchemaDetector};
pub use sequence::{
    FileSequenceStore, MemorySequenceStore, SequenceAllocator, SequenceError, SequenceResult,
    SequenceStore, SqliteSequenceStore,
};
pub use service::{
    load_directory, ChildTableWriter, Directory, DirectorySource, DistributionEngine,
    DistributionError, OrderReceipt, QueryOutcome, RecordQueryService, TableQuery, WritePlan,
};
pub use store::{MemorySheetStore, SheetStore, SqliteSheetStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
