mod config;
pub mod memory;
pub mod sqlite;

pub use config::{CatalogConfig, Config, StorageConfig, SyncConfig};
pub use memory::MemoryLedgerStore;
pub use sqlite::SqliteLedgerStore;

use std::path::PathBuf;

use crate::error::StorageError;
use crate::ledger::LedgerState;

/// Scoped load/save of a user's ledger blob.
///
/// `save` must be all-or-nothing: a reader never observes a partially
/// written snapshot.
pub trait LedgerStore: Send + Sync {
    /// Load the stored state, or `None` if the user has none yet.
    fn load(&self, user_id: &str) -> Result<Option<LedgerState>, StorageError>;

    /// Replace the stored state.
    fn save(&self, user_id: &str, state: &LedgerState) -> Result<(), StorageError>;

    /// Remove the stored state. Returns whether anything was deleted.
    fn delete(&self, user_id: &str) -> Result<bool, StorageError>;
}

/// Returns the xpledger data directory.
///
/// `XPLEDGER_HOME` wins when set. Otherwise `~/.config/xpledger`, or
/// `~/.config/xpledger-dev` when `XPLEDGER_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("XPLEDGER_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("XPLEDGER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("xpledger-dev")
            } else {
                base_dir.join("xpledger")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
