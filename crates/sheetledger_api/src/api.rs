//! Use-case API for host applications.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions over the core read/write paths.
//! - Fold every failure into a `{success, message}` envelope.
//!
//! # Invariants
//! - Exported functions must not panic.
//! - Missing or empty tables are successful, empty responses; only backend,
//!   payload and config failures set `success=false`.
//! - Environment-derived paths are resolved once per process.

use log::error;
use serde::Serialize;
use sheetledger_core::db::open_db;
use sheetledger_core::model::directory::Department;
use sheetledger_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, load_directory,
    parse_order_payload, ping as ping_inner, DirectoryEntry, DirectorySource, DistributionEngine,
    DistributionError, FileSequenceStore, LedgerConfig, LocalClock, OrderReceipt, Record,
    RecordQueryService, SequenceAllocator, SqliteSheetStore, WritePlan, DEPARTMENTS,
};
use std::path::PathBuf;
use std::sync::OnceLock;

const DB_FILE_NAME: &str = "sheetledger.sqlite3";
const SEQUENCE_FILE_NAME: &str = "sheetledger_sequences.json";
static ENV_PATHS: OnceLock<LedgerPaths> = OnceLock::new();

/// Filesystem locations the API operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPaths {
    /// SQLite database backing the table store.
    pub db_path: PathBuf,
    /// JSON file backing the sequence counters.
    pub sequence_path: PathBuf,
    /// Optional `LedgerConfig` JSON; defaults apply when absent.
    pub config_path: Option<PathBuf>,
}

impl LedgerPaths {
    /// Reads `SHEETLEDGER_DB_PATH`, `SHEETLEDGER_SEQ_PATH` and
    /// `SHEETLEDGER_CONFIG`, falling back to the temp dir.
    pub fn from_env() -> Self {
        Self {
            db_path: env_path("SHEETLEDGER_DB_PATH")
                .unwrap_or_else(|| std::env::temp_dir().join(DB_FILE_NAME)),
            sequence_path: env_path("SHEETLEDGER_SEQ_PATH")
                .unwrap_or_else(|| std::env::temp_dir().join(SEQUENCE_FILE_NAME)),
            config_path: env_path("SHEETLEDGER_CONFIG"),
        }
    }

    fn config(&self) -> Result<LedgerConfig, String> {
        match &self.config_path {
            Some(path) => LedgerConfig::from_json_file(path).map_err(|err| err.to_string()),
            None => Ok(LedgerConfig::default()),
        }
    }

    fn sequences(&self) -> Result<FileSequenceStore, String> {
        FileSequenceStore::new(self.sequence_path.clone()).map_err(|err| err.to_string())
    }

    fn with_store<T>(
        &self,
        f: impl FnOnce(&SqliteSheetStore<'_>) -> Result<T, String>,
    ) -> Result<T, String> {
        let conn = open_db(&self.db_path).map_err(|err| format!("ledger DB open failed: {err}"))?;
        let store = SqliteSheetStore::try_new(&conn)
            .map_err(|err| format!("ledger store init failed: {err}"))?;
        f(&store)
    }
}

/// Minimal health-check API.
pub fn ping() -> String {
    ping_inner().to_owned()
}

pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Read-path response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    /// Active records, in table order.
    pub data: Vec<Record>,
    pub history: Vec<Record>,
    pub headers: Vec<String>,
    /// Empty when records were found.
    pub message: String,
}

impl QueryResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            history: Vec::new(),
            headers: Vec::new(),
            message: message.into(),
        }
    }
}

/// Write-path response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderResponse {
    pub success: bool,
    /// Assigned folios in input order; also set on partial writes.
    pub ids: Vec<String>,
    pub message: String,
    /// Serialized `WritePlan` to pass to `resume_order` after a partial
    /// write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_plan: Option<String>,
}

impl OrderResponse {
    fn completed(receipt: OrderReceipt) -> Self {
        Self {
            success: true,
            message: format!(
                "order distributed: {} id(s), {} row(s)",
                receipt.ids.len(),
                receipt.rows_written
            ),
            ids: receipt.ids,
            pending_plan: None,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            ids: Vec::new(),
            message: message.into(),
            pending_plan: None,
        }
    }

    fn from_outcome(
        op: &str,
        outcome: Result<Result<OrderReceipt, DistributionError>, String>,
    ) -> Self {
        match outcome {
            Ok(Ok(receipt)) => Self::completed(receipt),
            Ok(Err(err)) => {
                let message = format!("{op} failed: {err}");
                error!("event=api_call module=api status=error op={op} error={err}");
                match err {
                    DistributionError::PartialWrite { ids, plan, .. } => {
                        let mut message = message;
                        let pending_plan = encode_plan(&plan, op, &mut message);
                        Self {
                            success: false,
                            ids,
                            message,
                            pending_plan,
                        }
                    }
                    DistributionError::Sequence(_) => Self::failure(message),
                }
            }
            Err(err) => {
                error!("event=api_call module=api status=error op={op} error={err}");
                Self::failure(format!("{op} failed: {err}"))
            }
        }
    }
}

/// Serializes a pending plan; on failure the reason is appended to `message`.
fn encode_plan<P: Serialize + ?Sized>(
    plan: &P,
    op: &str,
    message: &mut String,
) -> Option<String> {
    match serde_json::to_string(plan) {
        Ok(json) => Some(json),
        Err(err) => {
            error!(
                "event=api_call module=api status=error op={op} error_code=plan_encode_failed error={err}"
            );
            message.push_str(&format!("; pending plan could not be encoded: {err}"));
            None
        }
    }
}

/// Staff directory response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryResponse {
    pub success: bool,
    pub entries: Vec<DirectoryEntry>,
    pub source: DirectorySource,
    pub departments: Vec<Department>,
    pub message: String,
}

/// Reads `table` from the environment-configured ledger.
pub fn query_records(table: String) -> QueryResponse {
    query_records_at(env_paths(), &table)
}

pub fn query_records_at(paths: &LedgerPaths, table: &str) -> QueryResponse {
    let result = paths.config().and_then(|config| {
        paths.with_store(|store| {
            RecordQueryService::new(store, &config)
                .query_records(table)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(query) => QueryResponse {
            success: true,
            message: query.outcome.message(),
            data: query.extraction.active,
            history: query.extraction.history,
            headers: query.extraction.headers,
        },
        Err(err) => {
            error!("event=api_call module=api status=error op=query_records error={err}");
            QueryResponse::failure(format!("query_records failed: {err}"))
        }
    }
}

/// Distributes a JSON array of orders on behalf of `active_user`.
pub fn process_order(payload_json: String, active_user: String) -> OrderResponse {
    process_order_at(env_paths(), &payload_json, &active_user)
}

pub fn process_order_at(
    paths: &LedgerPaths,
    payload_json: &str,
    active_user: &str,
) -> OrderResponse {
    let items = match parse_order_payload(payload_json) {
        Ok(items) => items,
        Err(err) => return OrderResponse::failure(format!("process_order failed: {err}")),
    };
    let outcome = paths.config().and_then(|config| {
        let sequences = paths.sequences()?;
        paths.with_store(|store| {
            Ok(DistributionEngine::new(store, sequences, LocalClock, config)
                .process_order(&items, active_user))
        })
    });
    OrderResponse::from_outcome("process_order", outcome)
}

/// Finishes a plan returned in `OrderResponse::pending_plan`.
pub fn resume_order(plan_json: String) -> OrderResponse {
    resume_order_at(env_paths(), &plan_json)
}

pub fn resume_order_at(paths: &LedgerPaths, plan_json: &str) -> OrderResponse {
    let plan = match serde_json::from_str::<WritePlan>(plan_json) {
        Ok(plan) => plan,
        Err(err) => {
            return OrderResponse::failure(format!("resume_order failed: invalid plan: {err}"))
        }
    };
    let outcome = paths.config().and_then(|config| {
        let sequences = paths.sequences()?;
        paths.with_store(|store| {
            Ok(DistributionEngine::new(store, sequences, LocalClock, config).resume(plan))
        })
    });
    OrderResponse::from_outcome("resume_order", outcome)
}

/// Predicts the next value of `key` (default `WORKORDER_SEQ`), padded to
/// four digits, without allocating it.
///
/// Returns an empty string when the counter file cannot be read.
pub fn peek_next_sequence(key: Option<String>) -> String {
    peek_next_sequence_at(env_paths(), key.as_deref())
}

pub fn peek_next_sequence_at(paths: &LedgerPaths, key: Option<&str>) -> String {
    let result = paths.config().and_then(|config| {
        let key = key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .unwrap_or(config.sequence_key.as_str());
        SequenceAllocator::new(paths.sequences()?)
            .peek_next_padded(key)
            .map_err(|err| err.to_string())
    });
    result.unwrap_or_else(|err| {
        error!("event=api_call module=api status=error op=peek_next_sequence error={err}");
        String::new()
    })
}

/// Lists staff from the directory table, or the built-in list.
pub fn list_directory() -> DirectoryResponse {
    list_directory_at(env_paths())
}

pub fn list_directory_at(paths: &LedgerPaths) -> DirectoryResponse {
    let departments = DEPARTMENTS.to_vec();
    let result = paths.config().and_then(|config| {
        paths.with_store(|store| Ok(load_directory(store, &config.directory_table)))
    });
    match result {
        Ok(directory) => DirectoryResponse {
            success: true,
            entries: directory.entries,
            source: directory.source,
            departments,
            message: String::new(),
        },
        Err(err) => {
            error!("event=api_call module=api status=error op=list_directory error={err}");
            DirectoryResponse {
                success: false,
                entries: Vec::new(),
                source: DirectorySource::Builtin,
                departments,
                message: format!("list_directory failed: {err}"),
            }
        }
    }
}

fn env_paths() -> &'static LedgerPaths {
    ENV_PATHS.get_or_init(LedgerPaths::from_env)
}

fn env_path(var: &str) -> Option<PathBuf> {
    let raw = std::env::var(var).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(trimmed))
}
