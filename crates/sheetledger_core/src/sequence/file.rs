//! JSON-file sequence store.
//!
//! The whole key→value map lives in one JSON object and is rewritten on
//! every allocation through a fresh temp file and rename.
//!
//! # Invariants
//! - Read-increment-persist holds an exclusive OS lock on `<path>.lock`,
//!   so allocations are serialized across threads and processes.
//! - Every writer uses its own temp file in the target directory.
//! - An undecodable file is reported as `SequenceError::Corrupt` and never
//!   overwritten; counters do not restart from it.

use super::{SequenceError, SequenceResult, SequenceStore, DEFAULT_SEQUENCE_START};
use fs2::FileExt;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Sequence store persisted as a flat JSON map on disk.
pub struct FileSequenceStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileSequenceStore {
    /// Binds a store to `path`, creating its directory; the file itself is
    /// created on first allocation.
    pub fn new(path: impl Into<PathBuf>) -> SequenceResult<Self> {
        let path = path.into();
        if let Some(parent) = parent_dir(&path) {
            fs::create_dir_all(parent).map_err(|source| SequenceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut lock_name = path.as_os_str().to_owned();
        lock_name.push(".lock");
        Ok(Self {
            path,
            lock_path: PathBuf::from(lock_name),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Blocks until this process owns `<path>.lock`; released on drop.
    fn acquire(&self) -> SequenceResult<File> {
        let io_err = |source| SequenceError::Io {
            path: self.lock_path.clone(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(io_err)?;
        file.lock_exclusive().map_err(io_err)?;
        debug!(
            "event=sequence_lock module=sequence status=ok path={}",
            self.lock_path.display()
        );
        Ok(file)
    }

    fn read_map(&self) -> SequenceResult<Map<String, Value>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(SequenceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let detail = match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(other) => format!("top-level value is {}", json_kind(&other)),
            Err(err) => err.to_string(),
        };
        warn!(
            "event=sequence_read module=sequence status=error error_code=corrupt_file path={}",
            self.path.display()
        );
        Err(SequenceError::Corrupt {
            path: self.path.clone(),
            detail,
        })
    }

    fn write_map(&self, map: &Map<String, Value>) -> SequenceResult<()> {
        let io_err = |source| SequenceError::Io {
            path: self.path.clone(),
            source,
        };
        let encoded = serde_json::to_vec(map).map_err(SequenceError::Encode)?;
        let dir = parent_dir(&self.path).unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&encoded).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|err| io_err(err.error))?;
        Ok(())
    }
}

impl SequenceStore for FileSequenceStore {
    // Rename is atomic, so readers see either the old or the new map.
    fn peek(&self, key: &str) -> SequenceResult<i64> {
        let map = self.read_map()?;
        stored_value(&map, key)
    }

    fn increment(&self, key: &str) -> SequenceResult<i64> {
        let _lock = self.acquire()?;
        let mut map = self.read_map()?;
        let next = stored_value(&map, key)? + 1;
        map.insert(key.to_string(), Value::from(next));
        self.write_map(&map)?;
        Ok(next)
    }
}

fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|dir| !dir.as_os_str().is_empty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Reads `key` from the map; integers and numeric strings are accepted.
fn stored_value(map: &Map<String, Value>, key: &str) -> SequenceResult<i64> {
    let Some(value) = map.get(key) else {
        return Ok(DEFAULT_SEQUENCE_START);
    };
    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| SequenceError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::FileSequenceStore;
    use crate::sequence::{SequenceError, SequenceStore};
    use std::fs;

    #[test]
    fn missing_file_defaults_and_first_increment_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sequences.json");
        let store = FileSequenceStore::new(&path).unwrap();

        assert_eq!(store.peek("WORKORDER_SEQ").unwrap(), 1000);
        assert_eq!(store.increment("WORKORDER_SEQ").unwrap(), 1001);

        let persisted: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(persisted["WORKORDER_SEQ"], 1001);
    }

    #[test]
    fn increment_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sequences.json");
        fs::write(&path, r#"{"A": 5, "B": "41"}"#).unwrap();
        let store = FileSequenceStore::new(&path).unwrap();

        assert_eq!(store.increment("B").unwrap(), 42);
        let persisted: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(persisted["A"], 5);
        assert_eq!(persisted["B"], 42);
    }

    #[test]
    fn corrupt_file_is_reported_and_left_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sequences.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileSequenceStore::new(&path).unwrap();

        let err = store.increment("X").unwrap_err();
        assert!(matches!(err, SequenceError::Corrupt { .. }));
        assert!(store.peek("X").is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[test]
    fn non_object_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sequences.json");
        fs::write(&path, "[1001]").unwrap();
        let store = FileSequenceStore::new(&path).unwrap();

        let err = store.increment("X").unwrap_err();
        assert!(err.to_string().contains("an array"), "{err}");
    }

    #[test]
    fn non_numeric_value_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sequences.json");
        fs::write(&path, r#"{"X": "abc"}"#).unwrap();
        let store = FileSequenceStore::new(&path).unwrap();

        let err = store.increment("X").unwrap_err();
        assert!(matches!(err, SequenceError::InvalidValue { key, .. } if key == "X"));
    }

    #[test]
    fn missing_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sequences.json");
        let store = FileSequenceStore::new(&path).unwrap();

        assert_eq!(store.increment("X").unwrap(), 1001);
        assert!(path.exists());
        assert!(dir.path().join("nested").join("sequences.json.lock").exists());
    }
}
