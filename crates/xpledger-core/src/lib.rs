//! # xpledger Core Library
//!
//! This library provides the client-side XP economy: users earn XP for
//! actions, XP determines rank and level, thresholds unlock achievements, and
//! spendable XP buys rewards from a fixed catalog. The local ledger is
//! reconciled against an authoritative server copy.
//!
//! ## Architecture
//!
//! - **Catalog**: validated, immutable achievement/rank/reward tables
//! - **Ledger**: the only mutator of a user's [`LedgerState`], including the
//!   daily login streak
//! - **Resolver**: pure rank, progress and achievement derivation
//! - **Session**: binds a user to a ledger and a [`LedgerStore`], persisting
//!   every mutation atomically
//! - **Sync**: bigger-total-wins reconciliation with a remote authority
//!
//! ## Key Components
//!
//! - [`LedgerSession`]: per-user entry point for all mutations
//! - [`Catalog`]: economy tables
//! - [`SqliteLedgerStore`]: durable persistence
//! - [`ReconciliationClient`]: sync with the authority
//! - [`Config`]: application configuration management

pub mod catalog;
pub mod error;
pub mod ledger;
pub mod resolver;
pub mod session;
pub mod storage;
pub mod sync;

pub use catalog::{Achievement, Catalog, EffectType, Rank, RewardDefinition};
pub use error::{CatalogError, ConfigError, CoreError, LedgerError, Result, StorageError};
pub use ledger::{Ledger, LedgerState, LoginOutcome, PurchaseRecord, StreakState};
pub use resolver::UnlockedAchievement;
pub use session::LedgerSession;
pub use storage::{Config, LedgerStore, MemoryLedgerStore, SqliteLedgerStore};
pub use sync::{ReconciliationClient, Snapshot, SyncError, SyncReport};
