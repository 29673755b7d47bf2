//! Envelope API over `sheetledger_core` for host applications and the CLI.

pub mod api;

pub use api::*;
