//! SQLite Storage for runtime data
//!
//! 런타임 데이터 저장:
//! - Key-value entries: 저장된 체인 (`chain/<name>`) 등
//!
//! 설정 데이터는 JSON (storage/json/)에서 관리
//!
//! ## Schema Versions
//!
//! The schema version is recorded in `schema_version`; a database from a
//! newer binary is rejected on open.
//! - Version 1: kv table with creation/update timestamps and recency index

use super::KeyValueStore;
use crate::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Database file name inside the data directory
pub const DATABASE_FILE: &str = "linesmith.db";

/// SQLite-backed key-value store
#[derive(Clone)]
pub struct SqliteKv {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKv {
    /// Create a new storage instance in `data_dir`
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| Error::Persistence(format!("Failed to create data directory: {}", e)))?;

        let db_path = data_dir.join(DATABASE_FILE);
        let conn = Connection::open(&db_path)
            .map_err(|e| Error::Persistence(format!("Failed to open database: {}", e)))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| Error::Persistence(format!("Failed to set pragmas: {}", e)))?;

        debug!("Opened key-value database at {}", db_path.display());
        Self::from_connection(conn)
    }

    /// Create an in-memory storage (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            Error::Persistence(format!("Failed to create in-memory database: {}", e))
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let storage = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        storage.initialize_schema()?;
        storage.check_schema_version()?;

        Ok(storage)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Internal("Lock poisoned".to_string()))
    }

    /// Get current schema version from database
    pub fn get_schema_version(&self) -> Result<i32> {
        let conn = self.lock()?;

        conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .map_err(|e| Error::Persistence(format!("Failed to get schema version: {}", e)))
    }

    /// Initialize database schema (base tables)
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- Key-value entries
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_kv_updated ON kv(updated_at DESC);

            -- Insert initial schema version if not exists
            INSERT OR IGNORE INTO schema_version (version) VALUES (1);
            "#,
        )
        .map_err(|e| Error::Persistence(format!("Failed to initialize schema: {}", e)))?;

        Ok(())
    }

    /// Refuse databases written by a newer schema
    fn check_schema_version(&self) -> Result<()> {
        let version = self.get_schema_version()?;

        if version > CURRENT_SCHEMA_VERSION {
            warn!(
                "Database schema version {} is newer than supported {}",
                version, CURRENT_SCHEMA_VERSION
            );
            return Err(Error::Persistence(format!(
                "Database schema version {} is newer than supported version {}",
                version, CURRENT_SCHEMA_VERSION
            )));
        }

        debug!("Database schema is up to date (version {})", version);
        Ok(())
    }

    /// Number of stored entries
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
            .map_err(|e| Error::Persistence(format!("Failed to count entries: {}", e)))?;
        Ok(count as usize)
    }
}

// ============================================================================
// KeyValueStore
// ============================================================================

impl KeyValueStore for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;

        conn.query_row(
            "SELECT value FROM kv WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| Error::Persistence(format!("Failed to read '{}': {}", key, e)))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        let now = chrono::Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at, created_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value, now],
        )
        .map_err(|e| Error::Persistence(format!("Failed to write '{}': {}", key, e)))?;

        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let conn = self.lock()?;

        let affected = conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e| Error::Persistence(format!("Failed to delete '{}': {}", key, e)))?;

        Ok(affected > 0)
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
            )
            .map_err(|e| Error::Persistence(format!("Failed to prepare query: {}", e)))?;

        let keys = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))
            .map_err(|e| Error::Persistence(format!("Failed to query keys: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_storage() {
        let storage = SqliteKv::in_memory().expect("Failed to create storage");

        storage.put("chain/demo", "{}").expect("Failed to put");

        let retrieved = storage
            .get("chain/demo")
            .expect("Failed to get")
            .expect("Entry not found");

        assert_eq!(retrieved, "{}");
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[test]
    fn test_upsert_and_delete() {
        let storage = SqliteKv::in_memory().expect("Failed to create storage");

        storage.put("k", "one").unwrap();
        storage.put("k", "two").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("two"));
        assert_eq!(storage.count().unwrap(), 1);

        assert!(storage.delete("k").unwrap());
        assert!(!storage.delete("k").unwrap());
        assert!(storage.get("k").unwrap().is_none());
    }

    #[test]
    fn test_keys_by_prefix() {
        let storage = SqliteKv::in_memory().expect("Failed to create storage");
        storage.put("chain/b", "1").unwrap();
        storage.put("chain/a", "1").unwrap();
        storage.put("settings", "1").unwrap();

        let keys = storage.keys("chain/").unwrap();
        assert_eq!(keys, vec!["chain/a".to_string(), "chain/b".to_string()]);
    }

    #[test]
    fn test_schema_version() {
        let storage = SqliteKv::in_memory().expect("Failed to create storage");
        assert_eq!(storage.get_schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        SqliteKv::new(dir.path()).unwrap();
        {
            let conn = Connection::open(dir.path().join(DATABASE_FILE)).unwrap();
            conn.execute("INSERT INTO schema_version (version) VALUES (?1)", params![99])
                .unwrap();
        }

        let err = SqliteKv::new(dir.path()).err().unwrap();
        assert!(matches!(err, Error::Persistence(_)));
    }

    #[test]
    fn test_on_disk_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = SqliteKv::new(dir.path()).unwrap();
            storage.put("chain/persisted", "payload").unwrap();
        }
        let reopened = SqliteKv::new(dir.path()).unwrap();
        assert_eq!(
            reopened.get("chain/persisted").unwrap().as_deref(),
            Some("payload")
        );
    }
}
