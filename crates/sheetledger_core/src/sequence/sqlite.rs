//! SQLite sequence store backed by a single atomic upsert.

use super::{SequenceResult, SequenceStore, DEFAULT_SEQUENCE_START};
use rusqlite::{params, Connection, OptionalExtension};

pub struct SqliteSequenceStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSequenceStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SequenceStore for SqliteSequenceStore<'_> {
    fn peek(&self, key: &str) -> SequenceResult<i64> {
        let value = self
            .conn
            .query_row("SELECT value FROM sequences WHERE key = ?1;", [key], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?;
        Ok(value.unwrap_or(DEFAULT_SEQUENCE_START))
    }

    fn increment(&self, key: &str) -> SequenceResult<i64> {
        let value = self.conn.query_row(
            "INSERT INTO sequences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = value + 1,
                updated_at = (strftime('%s', 'now') * 1000)
             RETURNING value;",
            params![key, DEFAULT_SEQUENCE_START + 1],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteSequenceStore;
    use crate::db::open_db_in_memory;
    use crate::sequence::SequenceStore;

    #[test]
    fn upsert_allocates_monotonic_values() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteSequenceStore::new(&conn);

        assert_eq!(store.peek("X").unwrap(), 1000);
        assert_eq!(store.increment("X").unwrap(), 1001);
        assert_eq!(store.increment("X").unwrap(), 1002);
        assert_eq!(store.increment("Y").unwrap(), 1001);
        assert_eq!(store.peek("X").unwrap(), 1002);
    }
}
