//! Session setup shared by the ledger commands.

use std::sync::Arc;
use xpledger_core::{Config, LedgerSession, SqliteLedgerStore};

/// Resolve the user from the flag or config.
pub fn resolve_user(config: &Config, user: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    user.or_else(|| config.user_id.clone())
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| "no user given: pass --user or run `xpledger config set user_id <id>`".into())
}

/// Open the SQLite-backed session for the resolved user.
pub fn open_session(
    config: &Config,
    user: Option<String>,
) -> Result<LedgerSession, Box<dyn std::error::Error>> {
    let user_id = resolve_user(config, user)?;
    tracing::debug!(user_id = %user_id, db = %config.storage.database_file, "opening session");
    let catalog = Arc::new(config.catalog()?);
    let store = Arc::new(SqliteLedgerStore::open_default(&config.storage.database_file)?);
    Ok(LedgerSession::open(user_id, store, catalog)?)
}
