//! Monotonic per-key counters.
//!
//! # Responsibility
//! - Define `SequenceStore`, the atomic increment contract.
//! - Provide `SequenceAllocator`, the use-case facade over a store.
//! - Provide file, SQLite and in-memory store implementations.
//!
//! # Invariants
//! - An absent key reads as `DEFAULT_SEQUENCE_START`.
//! - `increment` is serialized per backing resource and persisted before it
//!   returns; values never decrease for a key.

use crate::db::DbError;
use log::info;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub mod file;
pub mod sqlite;

pub use file::FileSequenceStore;
pub use sqlite::SqliteSequenceStore;

/// Value reported for keys that were never allocated.
pub const DEFAULT_SEQUENCE_START: i64 = 1000;

/// Key used by work-order folio generation.
pub const WORKORDER_SEQ: &str = "WORKORDER_SEQ";

pub type SequenceResult<T> = Result<T, SequenceError>;

#[derive(Debug)]
pub enum SequenceError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Encode(serde_json::Error),
    /// The counter file exists but is not a JSON object; left untouched.
    Corrupt { path: PathBuf, detail: String },
    /// Persisted value for `key` is not an integer.
    InvalidValue { key: String, value: String },
    Db(DbError),
    LockPoisoned,
}

impl Display for SequenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "sequence file `{}` I/O failed: {source}", path.display())
            }
            Self::Encode(err) => write!(f, "sequence map cannot be encoded: {err}"),
            Self::Corrupt { path, detail } => write!(
                f,
                "sequence file `{}` is not a JSON object: {detail}",
                path.display()
            ),
            Self::InvalidValue { key, value } => {
                write!(f, "sequence `{key}` holds non-integer value `{value}`")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::LockPoisoned => write!(f, "sequence lock poisoned"),
        }
    }
}

impl Error for SequenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Corrupt { .. } | Self::InvalidValue { .. } | Self::LockPoisoned => None,
        }
    }
}

impl From<DbError> for SequenceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SequenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistent counter backend with an atomic increment.
pub trait SequenceStore {
    /// Reads the current value without allocating.
    fn peek(&self, key: &str) -> SequenceResult<i64>;
    /// Atomically increments `key`, persists it, and returns the new value.
    fn increment(&self, key: &str) -> SequenceResult<i64>;
}

impl<T: SequenceStore + ?Sized> SequenceStore for &T {
    fn peek(&self, key: &str) -> SequenceResult<i64> {
        (**self).peek(key)
    }

    fn increment(&self, key: &str) -> SequenceResult<i64> {
        (**self).increment(key)
    }
}

impl<T: SequenceStore + ?Sized> SequenceStore for Arc<T> {
    fn peek(&self, key: &str) -> SequenceResult<i64> {
        (**self).peek(key)
    }

    fn increment(&self, key: &str) -> SequenceResult<i64> {
        (**self).increment(key)
    }
}

/// Use-case facade for sequence allocation.
pub struct SequenceAllocator<Q: SequenceStore> {
    store: Q,
}

impl<Q: SequenceStore> SequenceAllocator<Q> {
    pub fn new(store: Q) -> Self {
        Self { store }
    }

    /// Returns the current value of `key` (read-only).
    pub fn peek(&self, key: &str) -> SequenceResult<i64> {
        self.store.peek(key)
    }

    /// Allocates the next value of `key`.
    pub fn next(&self, key: &str) -> SequenceResult<i64> {
        let value = self.store.increment(key)?;
        info!("event=sequence_next module=sequence status=ok key={key} value={value}");
        Ok(value)
    }

    /// Predicts the next value of `key`, zero-padded to four digits.
    pub fn peek_next_padded(&self, key: &str) -> SequenceResult<String> {
        Ok(format!("{:04}", self.peek(key)? + 1))
    }
}

/// Process-local counters for tests and dry runs.
#[derive(Default)]
pub struct MemorySequenceStore {
    values: Mutex<HashMap<String, i64>>,
}

impl MemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store with `key` already at `value`.
    pub fn with_value(key: &str, value: i64) -> Self {
        let store = Self::new();
        if let Ok(mut values) = store.values.lock() {
            values.insert(key.to_string(), value);
        }
        store
    }
}

impl SequenceStore for MemorySequenceStore {
    fn peek(&self, key: &str) -> SequenceResult<i64> {
        let values = self.values.lock().map_err(|_| SequenceError::LockPoisoned)?;
        Ok(values.get(key).copied().unwrap_or(DEFAULT_SEQUENCE_START))
    }

    fn increment(&self, key: &str) -> SequenceResult<i64> {
        let mut values = self.values.lock().map_err(|_| SequenceError::LockPoisoned)?;
        let slot = values
            .entry(key.to_string())
            .or_insert(DEFAULT_SEQUENCE_START);
        *slot += 1;
        Ok(*slot)
    }
}
