//! Reconciliation with the authoritative ledger service.
//!
//! The local ledger is an optimistic cache. A sync sends the full
//! [`Snapshot`] out and adopts the response only if its lifetime XP is
//! larger.

pub mod authority;
pub mod client;
pub mod reconcile;
pub mod types;


pub use authority::{HttpAuthority, RemoteAuthority};
pub use client::ReconciliationClient;
pub use reconcile::{decide_merge, MergeDecision};
pub use types::{Credential, Snapshot, SyncError, SyncReport};
