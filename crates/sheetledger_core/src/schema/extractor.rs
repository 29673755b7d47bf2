//! Row-to-record extraction below a detected header.
//!
//! # Responsibility
//! - Align data rows to non-empty header columns.
//! - Partition records into active and history segments at the sentinel.
//!
//! # Invariants
//! - Once the sentinel row is seen, every later record is history.
//! - Blank rows, the sentinel row and pasted duplicate headers never
//!   produce records.
//! - `row_index = header_index + offset + 2` (1-based, header counted).

use crate::model::record::{Extraction, Record, Row};

/// Marker row content separating active rows from completed ones.
pub const DEFAULT_HISTORY_SENTINEL: &str = "TAREAS REALIZADAS";

#[derive(Debug, Clone)]
pub struct RecordExtractor {
    history_sentinel: String,
}

impl Default for RecordExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SENTINEL)
    }
}

impl RecordExtractor {
    pub fn new(history_sentinel: &str) -> Self {
        Self {
            history_sentinel: history_sentinel.to_uppercase(),
        }
    }

    /// Extracts records from every row after `header_index`.
    ///
    /// Short rows are padded with empty strings; cells beyond the header
    /// width are ignored.
    pub fn extract(&self, rows: &[Row], header_index: usize) -> Extraction {
        let Some(header_row) = rows.get(header_index) else {
            return Extraction::default();
        };

        let columns = header_row
            .iter()
            .enumerate()
            .map(|(index, cell)| (index, cell.trim().to_string()))
            .filter(|(_, label)| !label.is_empty())
            .collect::<Vec<_>>();
        let headers = columns
            .iter()
            .map(|(_, label)| label.clone())
            .collect::<Vec<_>>();

        let mut extraction = Extraction {
            headers,
            ..Extraction::default()
        };
        let mut in_history = false;

        for (offset, row) in rows.iter().enumerate().skip(header_index + 1) {
            let offset = offset - header_index - 1;
            if self.is_sentinel(row) {
                in_history = true;
                continue;
            }
            if is_blank(row) || is_repeated_header(row, &columns) {
                continue;
            }

            let mut record = columns
                .iter()
                .map(|(index, label)| {
                    let value = row.get(*index).cloned().unwrap_or_default();
                    (label.clone(), value)
                })
                .collect::<Record>();
            if !record.has_data() {
                continue;
            }
            record.row_index = Some(header_index + offset + 2);

            if in_history {
                extraction.history.push(record);
            } else {
                extraction.active.push(record);
            }
        }

        extraction
    }

    fn is_sentinel(&self, row: &[String]) -> bool {
        let signature = row
            .iter()
            .map(|cell| cell.to_uppercase())
            .collect::<Vec<_>>()
            .join("|");
        signature.contains(&self.history_sentinel)
    }
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

fn is_repeated_header(row: &[String], columns: &[(usize, String)]) -> bool {
    let Some((first_index, first_label)) = columns.first() else {
        return false;
    };
    row.get(*first_index)
        .is_some_and(|cell| cell.to_uppercase() == first_label.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::RecordExtractor;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn empty_header_columns_are_dropped() {
        let rows = vec![
            row(&["FOLIO", "", "CONCEPTO"]),
            row(&["1", "ignored", "Pintura"]),
        ];
        let extraction = RecordExtractor::default().extract(&rows, 0);
        assert_eq!(extraction.headers, vec!["FOLIO", "CONCEPTO"]);
        let record = &extraction.active[0];
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("CONCEPTO"), Some("Pintura"));
    }

    #[test]
    fn short_rows_are_padded_with_empty_values() {
        let rows = vec![row(&["FOLIO", "CONCEPTO", "AVANCE"]), row(&["7"])];
        let extraction = RecordExtractor::default().extract(&rows, 0);
        assert_eq!(extraction.active[0].get("AVANCE"), Some(""));
    }

    #[test]
    fn repeated_header_rows_are_skipped() {
        let rows = vec![
            row(&["FOLIO", "CONCEPTO"]),
            row(&["1", "a"]),
            row(&["folio", "concepto"]),
            row(&["2", "b"]),
        ];
        let extraction = RecordExtractor::default().extract(&rows, 0);
        let folios = extraction
            .active
            .iter()
            .map(|record| record.get("FOLIO").unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(folios, vec!["1", "2"]);
    }

    #[test]
    fn rows_with_values_only_outside_header_columns_are_dropped() {
        let rows = vec![row(&["FOLIO", ""]), row(&["", "orphan"])];
        let extraction = RecordExtractor::default().extract(&rows, 0);
        assert!(extraction.is_empty());
    }

    #[test]
    fn sentinel_match_is_case_insensitive() {
        let rows = vec![
            row(&["FOLIO", "CONCEPTO"]),
            row(&["1", "a"]),
            row(&["Tareas realizadas", ""]),
            row(&["2", "b"]),
        ];
        let extraction = RecordExtractor::default().extract(&rows, 0);
        assert_eq!(extraction.active.len(), 1);
        assert_eq!(extraction.history.len(), 1);
        assert_eq!(extraction.history[0].row_index, Some(4));
    }

    #[test]
    fn out_of_range_header_index_yields_nothing() {
        let rows = vec![row(&["FOLIO"])];
        let extraction = RecordExtractor::default().extract(&rows, 5);
        assert!(extraction.is_empty());
        assert!(extraction.headers.is_empty());
    }
}
