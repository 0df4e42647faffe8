//! SQLite-backed ledger persistence.
//!
//! One row per user holding the JSON-encoded [`LedgerState`]. Every save runs
//! in its own transaction, so readers only ever see complete snapshots.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;

use super::{data_dir, LedgerStore};
use crate::error::StorageError;
use crate::ledger::LedgerState;

/// Bumped when the table layout changes.
const SCHEMA_VERSION: i32 = 1;

/// SQLite database for ledger snapshots.
pub struct SqliteLedgerStore {
    conn: Mutex<Connection>,
}

impl SqliteLedgerStore {
    /// Open `<data_dir>/<file_name>`.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open_default(file_name: &str) -> Result<Self, StorageError> {
        Self::open(&data_dir()?.join(file_name))
    }

    /// Open (and create if needed) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::QueryFailed("connection lock poisoned".to_string()))
    }

    /// Ids of every stored user.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn user_ids(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT user_id FROM ledgers ORDER BY user_id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

fn migrate(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS ledgers (
            user_id     TEXT PRIMARY KEY,
            snapshot    TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );",
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        params![SCHEMA_VERSION],
    )?;
    Ok(())
}

impl LedgerStore for SqliteLedgerStore {
    fn load(&self, user_id: &str) -> Result<Option<LedgerState>, StorageError> {
        let conn = self.conn()?;
        let blob: Option<String> = conn
            .query_row(
                "SELECT snapshot FROM ledgers WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        blob.map(|json| {
            serde_json::from_str(&json).map_err(|source| StorageError::Corrupt {
                user_id: user_id.to_string(),
                source,
            })
        })
        .transpose()
    }

    fn save(&self, user_id: &str, state: &LedgerState) -> Result<(), StorageError> {
        let json = serde_json::to_string(state).map_err(|source| StorageError::Corrupt {
            user_id: user_id.to_string(),
            source,
        })?;

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO ledgers (user_id, snapshot, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET snapshot = excluded.snapshot,
                                               updated_at = excluded.updated_at",
            params![user_id, json, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete(&self, user_id: &str) -> Result<bool, StorageError> {
        let conn = self.conn()?;
        let n = conn.execute("DELETE FROM ledgers WHERE user_id = ?1", params![user_id])?;
        Ok(n > 0)
    }
}
