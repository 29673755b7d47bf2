use rusqlite::Connection;
use sheetledger_core::db::migrations::{latest_version, require_current, schema_version};
use sheetledger_core::db::{open_db, open_db_in_memory, DbError};
use sheetledger_core::{SheetStore, SqliteSheetStore, StoreError};

const BOOKKEEPING_TABLES: [&str; 3] = ["sheet_tables", "sheet_rows", "sequences"];

#[test]
fn fresh_ledger_gets_bookkeeping_tables() {
    let conn = open_db_in_memory().unwrap();

    require_current(&conn).unwrap();
    for table in BOOKKEEPING_TABLES {
        assert!(has_table(&conn, table), "missing {table}");
    }
}

#[test]
fn reopening_a_ledger_keeps_rows_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        let store = SqliteSheetStore::try_new(&conn).unwrap();
        store.create_table("PPCV3", 1000, 30).unwrap();
        store
            .append_row("PPCV3", &["ID".to_string(), "CLIENTE".to_string()])
            .unwrap();
        store
            .append_row("PPCV3", &["F-1".to_string(), "Acme".to_string()])
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    let store = SqliteSheetStore::try_new(&conn).unwrap();
    let rows = store.get_rows("PPCV3").unwrap().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], vec!["F-1".to_string(), "Acme".to_string()]);
}

#[test]
fn sheet_store_refuses_a_bare_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let Err(err) = SqliteSheetStore::try_new(&conn) else {
        panic!("unmigrated connection was accepted");
    };
    assert!(matches!(err, StoreError::Unavailable(_)));
    assert!(err.to_string().contains("older than required"));
}

#[test]
fn ledger_written_by_newer_build_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");
    Connection::open(&path)
        .unwrap()
        .pragma_update(None, "user_version", 999)
        .unwrap();

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn has_table(conn: &Connection, name: &str) -> bool {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1;",
        [name],
        |row| row.get::<_, i64>(0),
    )
    .unwrap()
        == 1
}
