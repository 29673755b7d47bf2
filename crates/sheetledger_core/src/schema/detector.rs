//! Keyword-driven header row detection.
//!
//! # Responsibility
//! - Normalize a raw row into a searchable signature.
//! - Locate the header row by evaluating an ordered list of `HeaderRule`s.
//!
//! # Invariants
//! - At most `scan_limit` leading rows are inspected.
//! - Rules are evaluated in order per row; the first matching row wins.
//! - No match is a normal outcome (`None`), never an error.

use crate::model::record::Row;
use log::debug;

/// Maximum number of leading rows inspected for a header.
pub const HEADER_SCAN_LIMIT: usize = 100;

/// One header-shape predicate over a normalized row signature.
///
/// Matches when the signature contains every token in `all` and at least
/// one token from each group in `any_of`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderRule {
    pub name: &'static str,
    pub all: &'static [&'static str],
    pub any_of: &'static [&'static [&'static str]],
}

impl HeaderRule {
    pub fn matches(&self, signature: &str) -> bool {
        self.all.iter().all(|token| signature.contains(token))
            && self
                .any_of
                .iter()
                .all(|group| group.iter().any(|token| signature.contains(token)))
    }
}

/// Known header shapes, most specific first.
pub const DEFAULT_HEADER_RULES: &[HeaderRule] = &[
    HeaderRule {
        name: "site_or_project_id",
        all: &[],
        any_of: &[&["ID_SITIO", "ID_PROYECTO"]],
    },
    HeaderRule {
        name: "folio_concept_tracking",
        all: &["FOLIO", "CONCEPTO"],
        any_of: &[&["ALTA", "AVANCE", "STATUS", "FECHA"]],
    },
    HeaderRule {
        name: "id_responsible",
        all: &["ID", "RESPONSABLE"],
        any_of: &[],
    },
    HeaderRule {
        name: "identifier_description",
        all: &[],
        any_of: &[&["FOLIO", "ID"], &["DESCRIPCI", "RESPONSABLE", "CONCEPTO"]],
    },
    HeaderRule {
        name: "client_sales",
        all: &["CLIENTE"],
        any_of: &[&["VENDEDOR", "AREA", "CLASIFICACION"]],
    },
    HeaderRule {
        name: "user_titles",
        all: &["ID", "TITULO", "USUARIO"],
        any_of: &[],
    },
    HeaderRule {
        name: "user_habits",
        all: &["ID", "HABITO", "USUARIO"],
        any_of: &[],
    },
];

/// Builds the normalized signature of one row.
///
/// Cells are uppercased, line breaks become spaces, each cell is trimmed,
/// and cells are joined with `|`.
pub fn header_signature(row: &[String]) -> String {
    row.iter()
        .map(|cell| cell.to_uppercase().replace(['\r', '\n'], " ").trim().to_string())
        .collect::<Vec<_>>()
        .join("|")
}

/// Ordered-rule header locator.
#[derive(Debug, Clone)]
pub struct SchemaDetector {
    rules: Vec<HeaderRule>,
    scan_limit: usize,
}

impl Default for SchemaDetector {
    fn default() -> Self {
        Self::with_rules(DEFAULT_HEADER_RULES.to_vec())
    }
}

impl SchemaDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<HeaderRule>) -> Self {
        Self {
            rules,
            scan_limit: HEADER_SCAN_LIMIT,
        }
    }

    pub fn rules(&self) -> &[HeaderRule] {
        &self.rules
    }

    /// Returns the first rule matching `signature`.
    pub fn matching_rule(&self, signature: &str) -> Option<&HeaderRule> {
        self.rules.iter().find(|rule| rule.matches(signature))
    }

    /// Returns the 0-based header row index, or `None` when no row in the
    /// scan window matches any rule.
    pub fn detect(&self, rows: &[Row]) -> Option<usize> {
        rows.iter()
            .take(self.scan_limit)
            .enumerate()
            .find_map(|(index, row)| {
                let rule = self.matching_rule(&header_signature(row))?;
                debug!(
                    "event=header_detect module=schema status=ok row={index} rule={}",
                    rule.name
                );
                Some(index)
            })
    }
}
