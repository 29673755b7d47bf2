//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store, sequence and schema components into use-cases.
//! - Keep the API and CLI layers decoupled from storage details.

pub mod child_writer;
pub mod directory_service;
pub mod distribution;
pub mod query_service;

pub use child_writer::ChildTableWriter;
pub use directory_service::{load_directory, Directory, DirectorySource};
pub use distribution::{
    DistributionEngine, DistributionError, FailedWrite, OrderReceipt, WriteKey, WritePlan,
    WriteStep, WriteTarget,
};
pub use query_service::{QueryOutcome, RecordQueryService, TableQuery};
