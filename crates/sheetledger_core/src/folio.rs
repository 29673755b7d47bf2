//! Human-readable order identifiers.
//!
//! # Responsibility
//! - Generate work-order folios `{seq}{client} {dept} {DDMMYY}`.
//! - Generate random fallback folios `{prefix}-######`.
//!
//! # Invariants
//! - The generated format is bit-for-bit compatible with identifiers
//!   already stored in existing ledgers; do not change abbreviations.
//! - Every generated folio consumes exactly one sequence value.
//! - Fallback folios are not checked against existing ones.

use crate::sequence::{SequenceAllocator, SequenceResult, SequenceStore, WORKORDER_SEQ};
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

static CLIENT_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Z0-9 ]").expect("valid client strip regex"));

const DEPARTMENT_ABBREVIATIONS: &[(&str, &str)] = &[
    ("ELECTROMECANICA", "Electro"),
    ("ELECTROMECÁNICA", "Electro"),
    ("CONSTRUCCION", "Const"),
    ("CONSTRUCCIÓN", "Const"),
    ("MANTENIMIENTO", "Mtto"),
    ("REMODELACION", "Remod"),
    ("REMODELACIÓN", "Remod"),
    ("REPARACION", "Repar"),
    ("REPARACIÓN", "Repar"),
    ("RECONFIGURACION", "Reconf"),
    ("RECONFIGURACIÓN", "Reconf"),
    ("POLIZA", "Poliza"),
    ("PÓLIZA", "Poliza"),
    ("INSPECCION", "Insp"),
    ("INSPECCIÓN", "Insp"),
    ("ADMINISTRACION", "Admin"),
    ("ADMINISTRACIÓN", "Admin"),
    ("MAQUINARIA", "Maq"),
    ("DISEÑO", "Diseño"),
    ("DISENO", "Diseño"),
    ("COMPRAS", "Compras"),
    ("VENTAS", "Ventas"),
    ("HVAC", "HVAC"),
    ("SEGURIDAD", "EHS"),
    ("EHS", "EHS"),
];

/// Source of the current local date.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// System local-time clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Work-order folio generator.
pub struct FolioGenerator<Q: SequenceStore, C: Clock> {
    allocator: SequenceAllocator<Q>,
    clock: C,
    sequence_key: String,
}

impl<Q: SequenceStore, C: Clock> FolioGenerator<Q, C> {
    pub fn new(sequences: Q, clock: C) -> Self {
        Self::with_sequence_key(sequences, clock, WORKORDER_SEQ)
    }

    pub fn with_sequence_key(sequences: Q, clock: C, sequence_key: impl Into<String>) -> Self {
        Self {
            allocator: SequenceAllocator::new(sequences),
            clock,
            sequence_key: sequence_key.into(),
        }
    }

    pub fn allocator(&self) -> &SequenceAllocator<Q> {
        &self.allocator
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Allocates a sequence value and formats a work-order folio.
    pub fn generate(&self, client_name: &str, department_name: &str) -> SequenceResult<String> {
        let seq = self.allocator.next(&self.sequence_key)?;
        Ok(format!(
            "{seq:04}{} {} {}",
            client_abbreviation(client_name),
            department_abbreviation(department_name),
            self.clock.today().format("%d%m%y")
        ))
    }
}

/// Two-letter client code from the first two words (or first word).
pub fn client_abbreviation(client_name: &str) -> String {
    let upper = client_name.trim().to_uppercase();
    let cleaned = CLIENT_STRIP_RE.replace_all(&upper, "");
    let words = cleaned.split_whitespace().collect::<Vec<_>>();
    match words.as_slice() {
        [] => "XX".to_string(),
        [only] => only.chars().take(2).collect(),
        [first, second, ..] => first.chars().take(1).chain(second.chars().take(1)).collect(),
    }
}

/// Short department code; unknown names are truncated and title-cased.
pub fn department_abbreviation(department_name: &str) -> String {
    let trimmed = department_name.trim().to_uppercase();
    let raw = if trimmed.is_empty() {
        "GENERAL".to_string()
    } else {
        trimmed
    };

    if let Some((_, abbr)) = DEPARTMENT_ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == raw)
    {
        return (*abbr).to_string();
    }

    let mut chars = raw.chars();
    let first = chars.next().map(String::from).unwrap_or_default();
    let rest = chars.collect::<String>().to_lowercase();
    if raw.chars().count() > 6 {
        format!("{first}{}", rest.chars().take(4).collect::<String>())
    } else {
        format!("{first}{rest}")
    }
}

/// Random `{prefix}-######` folio for orders outside the work-order flow.
pub fn fallback_folio<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> String {
    format!("{prefix}-{}", rng.random_range(100_000..=999_999))
}
