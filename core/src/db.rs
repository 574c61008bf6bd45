use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::{Connection, params};

use crate::storage::Storage;

/// SQLite-backed key-value store. Each value is a JSON document stored under a
/// versioned key.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS kv_store (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .with_context(|| format!("Failed to write '{key}'"))?;
        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv_store WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }
}

impl Storage for Database {
    fn load(&self, key: &str) -> Result<Option<String>> {
        self.get_value(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_version(db: &Database) -> i64 {
        db.conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap()
    }

    fn keys(db: &Database) -> Vec<String> {
        let mut stmt = db.conn.prepare("SELECT key FROM kv_store ORDER BY key").unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<String>>>()
            .unwrap()
    }

    #[test]
    fn test_migration_creates_kv_store() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(schema_version(&db), 1);
        assert!(keys(&db).is_empty());
    }

    #[test]
    fn test_set_get_value() {
        let db = Database::open_in_memory().unwrap();
        db.set_value("history_v1", "[]").unwrap();
        assert_eq!(db.get_value("history_v1").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_get_missing_value() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_value("nope").unwrap().is_none());
    }

    #[test]
    fn test_set_value_upserts() {
        let db = Database::open_in_memory().unwrap();
        db.set_value("k", "1").unwrap();
        db.set_value("k", "2").unwrap();
        assert_eq!(db.get_value("k").unwrap().as_deref(), Some("2"));
        assert_eq!(keys(&db), vec!["k".to_string()]);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nutriter.db");
        {
            let db = Database::open(&path).unwrap();
            db.set_value("macro_tally_v2", "[1]").unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.get_value("macro_tally_v2").unwrap().as_deref(), Some("[1]"));
        assert_eq!(schema_version(&db), 1);
    }
}
