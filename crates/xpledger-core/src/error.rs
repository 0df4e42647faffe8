//! Core error types for xpledger-core.
//!
//! Each concern owns a thiserror enum; [`CoreError`] aggregates them for
//! callers that just want to bubble failures up.
//!
//! Running out of XP or credits is not an error. Those outcomes come back as
//! `false` from the ledger because callers are expected to branch on them.

use std::path::PathBuf;
use thiserror::Error;

use crate::sync::SyncError;

/// Core error type for xpledger-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Ledger mutation rejected
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Catalog tables failed validation
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Persistence failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reconciliation failed
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

}

/// Rejected ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// XP amounts must be strictly positive
    #[error("Invalid XP amount {0}: must be greater than zero")]
    InvalidAmount(i64),

    /// No reward with this id in the catalog
    #[error("Unknown reward: {0}")]
    UnknownReward(String),

    /// Stacking the trial would push its expiry past the representable range
    #[error("Premium trial from '{0}' would extend past the supported date range")]
    TrialOutOfRange(String),
}

/// Structural problems in the catalog tables.
///
/// These are configuration bugs and are never recovered from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Catalog defines no ranks")]
    NoRanks,

    #[error("First rank '{id}' starts at {min_xp}; ranks must start at 0")]
    FirstRankNotZero { id: String, min_xp: u64 },

    #[error("Rank '{id}' has min_xp {min_xp} greater than max_xp {max_xp}")]
    InvertedRange { id: String, min_xp: u64, max_xp: u64 },

    #[error("Gap or overlap between rank '{previous}' and '{next}': expected min_xp {expected}, found {found}")]
    NotContiguous {
        previous: String,
        next: String,
        expected: u64,
        found: u64,
    },

    #[error("Rank '{0}' is unbounded but is not the top rank")]
    UnboundedBeforeTop(String),

    #[error("Top rank '{0}' must be unbounded")]
    BoundedTop(String),

    #[error("No rank covers {0} XP")]
    NoRankFor(u64),

    #[error("Reward '{0}' must have a positive cost")]
    ZeroCost(String),

    #[error("Reward '{0}' must have a positive effect magnitude")]
    ZeroMagnitude(String),

    #[error("Reward '{id}' grants {days} trial days; the maximum is {max}")]
    TrialTooLong { id: String, days: u32, max: u32 },

    #[error("Rank '{0}' ends at the largest XP value, leaving no room for higher ranks")]
    NoRoomAbove(String),

    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("Failed to parse catalog: {0}")]
    ParseFailed(String),
}

/// Persistence errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Stored blob could not be encoded or decoded
    #[error("Corrupt ledger snapshot for '{user_id}': {source}")]
    Corrupt {
        user_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Stored state decodes but breaks the balance or level invariant
    #[error("Inconsistent ledger for '{user_id}': total {total_xp}, spendable {current_xp}, level {level}")]
    Inconsistent {
        user_id: String,
        total_xp: u64,
        current_xp: u64,
        level: u64,
    },

    /// Could not resolve the data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseBusy
                    || err.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_convert_into_core_error() {
        let err: CoreError = LedgerError::UnknownReward("nope".into()).into();
        assert!(matches!(err, CoreError::Ledger(LedgerError::UnknownReward(_))));
        assert_eq!(err.to_string(), "Ledger error: Unknown reward: nope");
    }

    #[test]
    fn invalid_amount_message_includes_value() {
        assert_eq!(
            LedgerError::InvalidAmount(-3).to_string(),
            "Invalid XP amount -3: must be greater than zero"
        );
    }
}
