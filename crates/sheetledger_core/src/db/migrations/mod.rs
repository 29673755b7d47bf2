//! Versioned schema for the ledger database.
//!
//! # Invariants
//! - Steps are listed with strictly increasing versions starting at 1.
//! - All pending steps run in one transaction; `PRAGMA user_version`
//!   moves only when the whole batch commits.
//! - Only bookkeeping tables are declared here. Ledger tables are rows in
//!   `sheet_rows` and never get DDL of their own.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "sheets",
        sql: include_str!("0001_sheets.sql"),
    },
    Step {
        version: 2,
        name: "sequences",
        sql: include_str!("0002_sequences.sql"),
    },
];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Reads the version stamped on `conn`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

/// Fails unless `conn` carries exactly the latest schema.
pub fn require_current(conn: &Connection) -> DbResult<()> {
    let db_version = schema_version(conn)?;
    let latest = latest_version();
    if db_version < latest {
        return Err(DbError::SchemaBehind {
            db_version,
            required: latest,
        });
    }
    if db_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported: latest,
        });
    }
    Ok(())
}

/// Brings `conn` up to [`latest_version`].
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = schema_version(conn)?;
    let latest = latest_version();
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }
    let pending: Vec<&Step> = STEPS.iter().filter(|step| step.version > from).collect();
    if pending.is_empty() {
        return Ok(());
    }

    info!("event=db_migrate module=db status=start from={from} to={latest}");
    let tx = conn.transaction()?;
    for step in pending {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
            .map_err(|source| DbError::Migration {
                version: step.version,
                name: step.name,
                source,
            })?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;
    info!("event=db_migrate module=db status=ok version={latest}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, require_current, schema_version, STEPS};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn step_versions_are_contiguous() {
        for (index, step) in STEPS.iter().enumerate() {
            assert_eq!(step.version as usize, index + 1, "step {}", step.name);
        }
    }

    #[test]
    fn fresh_connection_is_behind_until_migrated() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert!(matches!(
            require_current(&conn),
            Err(DbError::SchemaBehind { db_version: 0, .. })
        ));

        apply_migrations(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), latest_version());
        require_current(&conn).unwrap();

        // second run finds nothing pending
        apply_migrations(&mut conn).unwrap();
    }

    #[test]
    fn partial_history_only_runs_newer_steps() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(STEPS[0].sql).unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();

        apply_migrations(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 2);
        let sequences: i64 = conn
            .query_row("SELECT COUNT(*) FROM sequences;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(sequences, 0);
    }
}
