//! Connection setup.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`, a busy timeout so
//!   concurrent sequence upserts wait rather than fail, and the latest
//!   schema applied.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) the ledger database at `path`.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    let started = Instant::now();
    let opened = Connection::open(path)
        .map_err(DbError::from)
        .and_then(prepare);
    report("file", started, &opened);
    opened
}

/// Opens a private in-memory ledger, used by tests and dry runs.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started = Instant::now();
    let opened = Connection::open_in_memory()
        .map_err(DbError::from)
        .and_then(prepare);
    report("memory", started, &opened);
    opened
}

fn prepare(mut conn: Connection) -> DbResult<Connection> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn report(mode: &str, started: Instant, outcome: &DbResult<Connection>) {
    let elapsed = started.elapsed().as_millis();
    match outcome {
        Ok(_) => info!("event=db_open module=db status=ok mode={mode} duration_ms={elapsed}"),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={elapsed} error={err}"
        ),
    }
}
