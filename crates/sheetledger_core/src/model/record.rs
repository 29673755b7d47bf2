//! Row and record shapes shared by the read and write paths.
//!
//! # Responsibility
//! - Define the raw `Row` cell sequence used by every `SheetStore`.
//! - Define `Record`, the header-keyed projection of one data row.
//!
//! # Invariants
//! - Record field order follows header order of the source table.
//! - Header labels are unique inside one record; re-inserting a label
//!   replaces its value in place.
//! - `row_index` is 1-based and counts the header row.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// One raw table row: ordered string cells.
pub type Row = Vec<String>;

/// Header-keyed projection of one table row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
    /// 1-based sheet row number; `None` for records not read from a table.
    pub row_index: Option<usize>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces one field, keeping first-insertion order.
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(key, _)| *key == label) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((label, value)),
        }
    }

    /// Returns a field value by exact label.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == label)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates `(label, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Returns whether at least one value is non-blank.
    pub fn has_data(&self) -> bool {
        self.fields.iter().any(|(_, value)| !value.trim().is_empty())
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = Record::new();
        for (label, value) in iter {
            record.insert(label, value);
        }
        record
    }
}

/// Serialized as a flat JSON object; `row_index` is emitted as `_rowIndex`.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(self.row_index.is_some());
        let mut map = serializer.serialize_map(Some(self.fields.len() + extra))?;
        for (label, value) in &self.fields {
            map.serialize_entry(label, value)?;
        }
        if let Some(row_index) = self.row_index {
            map.serialize_entry("_rowIndex", &row_index)?;
        }
        map.end()
    }
}

/// Active/history partitions produced by the read path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    /// Rows above the history sentinel, in table order.
    pub active: Vec<Record>,
    /// Rows below the history sentinel, in table order.
    pub history: Vec<Record>,
    /// Non-empty header labels, in column order.
    pub headers: Vec<String>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Record;

    #[test]
    fn insert_replaces_existing_label_in_place() {
        let mut record = Record::new();
        record.insert("FOLIO", "1");
        record.insert("CONCEPTO", "x");
        record.insert("FOLIO", "2");

        let labels = record.iter().map(|(label, _)| label).collect::<Vec<_>>();
        assert_eq!(labels, vec!["FOLIO", "CONCEPTO"]);
        assert_eq!(record.get("FOLIO"), Some("2"));
    }

    #[test]
    fn serializes_row_index_as_underscore_key() {
        let mut record: Record = [("FOLIO", "1001")].into_iter().collect();
        record.row_index = Some(3);
        let json = serde_json::to_value(&record).expect("record should serialize");
        assert_eq!(json["FOLIO"], "1001");
        assert_eq!(json["_rowIndex"], 3);
    }

    #[test]
    fn has_data_ignores_whitespace_values() {
        let record: Record = [("A", "  "), ("B", "")].into_iter().collect();
        assert!(!record.has_data());
    }
}
