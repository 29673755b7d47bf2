//! Domain model for schema-less table records and order payloads.
//!
//! # Responsibility
//! - Define raw rows, header-keyed records and read-path partitions.
//! - Define typed order payloads and their line-item variants.
//! - Define the staff directory and department catalog.
//!
//! # Invariants
//! - Records are append-only: core never updates or deletes a written row.
//! - Every child line-item record carries its parent folio.

pub mod directory;
pub mod order;
pub mod record;
