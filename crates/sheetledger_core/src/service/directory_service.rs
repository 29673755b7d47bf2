//! Staff directory lookup.
//!
//! Reads the directory table when it is usable and falls back to the
//! built-in staff list otherwise. Backend failures also fall back, so
//! callers always get a directory.

use crate::model::directory::{builtin_directory, DirectoryEntry, WorkMode};
use crate::store::SheetStore;
use log::{info, warn};
use serde::Serialize;

const NAME_HEADER: &str = "NOMBRE";
const DEPARTMENT_HEADER: &str = "DEPARTAMENTO";
const WORK_MODE_HEADER: &str = "TIPO_HOJA";
const DEFAULT_DEPARTMENT: &str = "GENERAL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectorySource {
    Table,
    Builtin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub entries: Vec<DirectoryEntry>,
    pub source: DirectorySource,
}

impl Directory {
    fn builtin() -> Self {
        Self {
            entries: builtin_directory(),
            source: DirectorySource::Builtin,
        }
    }
}

/// Loads staff entries from `table`.
pub fn load_directory<S: SheetStore + ?Sized>(store: &S, table: &str) -> Directory {
    let rows = match store.get_rows(table) {
        Ok(Some(rows)) if rows.len() >= 2 => rows,
        Ok(_) => return Directory::builtin(),
        Err(err) => {
            warn!(
                "event=directory_load module=directory status=fallback table={table} error={err}"
            );
            return Directory::builtin();
        }
    };

    let headers = rows[0]
        .iter()
        .map(|cell| cell.trim().to_uppercase())
        .collect::<Vec<_>>();
    let column = |label: &str| headers.iter().position(|header| header == label);
    let (Some(name_col), Some(dept_col), Some(mode_col)) = (
        column(NAME_HEADER),
        column(DEPARTMENT_HEADER),
        column(WORK_MODE_HEADER),
    ) else {
        warn!("event=directory_load module=directory status=fallback table={table} reason=headers");
        return Directory::builtin();
    };

    let entries = rows[1..]
        .iter()
        .filter_map(|row| {
            let name = row.get(name_col).map(|cell| cell.trim())?;
            if name.is_empty() {
                return None;
            }
            let department = row
                .get(dept_col)
                .map(|cell| cell.trim())
                .filter(|cell| !cell.is_empty())
                .unwrap_or(DEFAULT_DEPARTMENT);
            let work_mode = row
                .get(mode_col)
                .map(|cell| WorkMode::parse(cell))
                .unwrap_or(WorkMode::Standard);
            Some(DirectoryEntry::new(name, department, work_mode))
        })
        .collect::<Vec<_>>();

    info!(
        "event=directory_load module=directory status=ok table={table} entries={}",
        entries.len()
    );
    Directory {
        entries,
        source: DirectorySource::Table,
    }
}
