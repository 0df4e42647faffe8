//! Merge policy for authoritative snapshots.
//!
//! Bigger lifetime total wins, and it wins wholesale. There is no per-field
//! merge: a remote with a larger `total_xp` also replaces spendable XP, bonus
//! credits and trial expiry, even if those are older than the local values.

use crate::sync::types::Snapshot;

/// Merge decision for a remote snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    UseLocal,
    UseRemote,
}

/// Decide whether `remote` replaces `local`.
pub fn decide_merge(local: &Snapshot, remote: &Snapshot) -> MergeDecision {
    if remote.total_xp > local.total_xp {
        MergeDecision::UseRemote
    } else {
        MergeDecision::UseLocal
    }
}
