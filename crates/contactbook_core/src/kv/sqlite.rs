//! SQLite-backed key-value store over the `kv_entries` table.
//!
//! The connection must come from `db::open_db` / `db::open_db_in_memory`
//! so the table exists.

use super::{KvResult, KvStore};
use rusqlite::{params, Connection, OptionalExtension};

/// Durable store borrowing a migrated connection.
pub struct SqliteKvStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl KvStore for SqliteKvStore<'_> {
    fn exists(&self, key: &str) -> KvResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM kv_entries WHERE key = ?1);",
            [key],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &[u8]) -> KvResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> KvResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(changed > 0)
    }

    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: &[u8],
    ) -> KvResult<bool> {
        // Single statement per branch, so the guard and the write are atomic.
        let changed = match expected {
            None => self.conn.execute(
                "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO NOTHING;",
                params![key, value],
            )?,
            Some(current) => self.conn.execute(
                "UPDATE kv_entries
                 SET
                    value = ?2,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE key = ?1 AND value = ?3;",
                params![key, value, current],
            )?,
        };
        Ok(changed == 1)
    }
}
