//! Runtime configuration for table names and write-path policy.
//!
//! # Responsibility
//! - Name every table the write path fans out to.
//! - Hold the markers and limits the read/write paths depend on.
//!
//! # Invariants
//! - Every field has a default; a partial JSON document is valid.
//! - `validate()` must pass before a config reaches the engine.

use crate::model::order::LineCategory;
use crate::schema::DEFAULT_HISTORY_SENTINEL;
use crate::sequence::WORKORDER_SEQ;
use crate::store::TableDims;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

/// Child table name per line-item category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChildTables {
    pub materials: String,
    pub labor: String,
    pub tools: String,
    pub equipment: String,
    pub schedule: String,
}

impl Default for ChildTables {
    fn default() -> Self {
        Self {
            materials: "DB_WO_MATERIALES".to_string(),
            labor: "DB_WO_MANO_OBRA".to_string(),
            tools: "DB_WO_HERRAMIENTAS".to_string(),
            equipment: "DB_WO_EQUIPOS".to_string(),
            schedule: "DB_WO_PROGRAMA".to_string(),
        }
    }
}

impl ChildTables {
    pub fn table_for(&self, category: LineCategory) -> &str {
        match category {
            LineCategory::Materials => &self.materials,
            LineCategory::Labor => &self.labor,
            LineCategory::Tools => &self.tools,
            LineCategory::Equipment => &self.equipment,
            LineCategory::Schedule => &self.schedule,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Primary table with one row per order.
    pub ledger_table: String,
    /// Administrative full copy of the ledger.
    pub mirror_table: String,
    /// Staff directory table.
    pub directory_table: String,
    pub child_tables: ChildTables,
    /// Row content that starts the history segment.
    pub history_sentinel: String,
    /// Responsible names containing this marker get no shard copy.
    pub sales_marker: String,
    /// Active user that routes missing folios to the generator.
    pub prework_order_user: String,
    /// Prefix of random fallback folios.
    pub fallback_prefix: String,
    pub sequence_key: String,
    /// Attempts per write step, including the first one.
    pub max_write_attempts: u32,
    pub new_table_rows: usize,
    pub new_table_cols: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let dims = TableDims::default();
        Self {
            ledger_table: "PPCV3".to_string(),
            mirror_table: "ADMINISTRADOR".to_string(),
            directory_table: "DB_DIRECTORY".to_string(),
            child_tables: ChildTables::default(),
            history_sentinel: DEFAULT_HISTORY_SENTINEL.to_string(),
            sales_marker: "(VENTAS)".to_string(),
            prework_order_user: "PREWORK_ORDER".to_string(),
            fallback_prefix: "PPC".to_string(),
            sequence_key: WORKORDER_SEQ.to_string(),
            max_write_attempts: 3,
            new_table_rows: dims.rows,
            new_table_cols: dims.cols,
        }
    }
}

impl LedgerConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("ledger_table", self.ledger_table.as_str()),
            ("mirror_table", self.mirror_table.as_str()),
            ("directory_table", self.directory_table.as_str()),
            ("history_sentinel", self.history_sentinel.as_str()),
            ("sequence_key", self.sequence_key.as_str()),
        ];
        for (field, value) in named {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("`{field}` cannot be empty")));
            }
        }
        for category in LineCategory::ALL {
            if self.child_tables.table_for(category).trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "child table for `{}` cannot be empty",
                    category.as_str()
                )));
            }
        }
        if self.max_write_attempts == 0 {
            return Err(ConfigError::Invalid(
                "`max_write_attempts` must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn table_dims(&self) -> TableDims {
        TableDims {
            rows: self.new_table_rows,
            cols: self.new_table_cols,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, LedgerConfig};

    #[test]
    fn partial_json_keeps_defaults() {
        let config = LedgerConfig::from_json_str(
            r#"{"ledger_table": "LEDGER", "child_tables": {"labor": "LABOR"}}"#,
        )
        .expect("partial config should parse");
        assert_eq!(config.ledger_table, "LEDGER");
        assert_eq!(config.mirror_table, "ADMINISTRADOR");
        assert_eq!(config.child_tables.labor, "LABOR");
        assert_eq!(config.child_tables.materials, "DB_WO_MATERIALES");
        assert_eq!(config.max_write_attempts, 3);
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let err = LedgerConfig::from_json_str(r#"{"max_write_attempts": 0}"#)
            .expect_err("zero attempts must be rejected");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn blank_table_name_is_rejected() {
        let err = LedgerConfig::from_json_str(r#"{"mirror_table": "  "}"#)
            .expect_err("blank table must be rejected");
        assert!(err.to_string().contains("mirror_table"));
    }
}
