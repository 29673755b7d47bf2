//! Read-time structure detection for schema-less tables.
//!
//! # Responsibility
//! - Find the header row of a manually maintained table.
//! - Project the rows below it into active/history records.
//!
//! # Invariants
//! - The resolved header index drives both column alignment and the
//!   `row_index` of every extracted record.

pub mod detector;
pub mod extractor;

pub use detector::{header_signature, HeaderRule, SchemaDetector, DEFAULT_HEADER_RULES};
pub use extractor::{RecordExtractor, DEFAULT_HISTORY_SENTINEL};
