//! In-process ledger store for tests and embedding.

use std::collections::HashMap;
use std::sync::RwLock;

use super::LedgerStore;
use crate::error::StorageError;
use crate::ledger::LedgerState;

/// Keeps ledgers in a map. Each save swaps the whole entry under a lock.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    ledgers: RwLock<HashMap<String, LedgerState>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StorageError {
        StorageError::QueryFailed("memory store lock poisoned".to_string())
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self, user_id: &str) -> Result<Option<LedgerState>, StorageError> {
        let guard = self.ledgers.read().map_err(|_| Self::poisoned())?;
        Ok(guard.get(user_id).cloned())
    }

    fn save(&self, user_id: &str, state: &LedgerState) -> Result<(), StorageError> {
        let mut guard = self.ledgers.write().map_err(|_| Self::poisoned())?;
        guard.insert(user_id.to_string(), state.clone());
        Ok(())
    }

    fn delete(&self, user_id: &str) -> Result<bool, StorageError> {
        let mut guard = self.ledgers.write().map_err(|_| Self::poisoned())?;
        Ok(guard.remove(user_id).is_some())
    }
}
