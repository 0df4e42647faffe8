//! Per-user ledger session.
//!
//! A [`LedgerSession`] binds one user id to its [`Ledger`] and a store. Each
//! mutation runs on a copy of the ledger; the copy is persisted and only then
//! swapped in, so a failed write leaves both memory and storage unchanged.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::error::{Result, StorageError};
use crate::ledger::{Ledger, LoginOutcome};
use crate::resolver::UnlockedAchievement;
use crate::storage::LedgerStore;
use crate::sync::{decide_merge, MergeDecision, Snapshot};

pub struct LedgerSession {
    user_id: String,
    ledger: Ledger,
    store: Arc<dyn LedgerStore>,
}

impl std::fmt::Debug for LedgerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerSession")
            .field("user_id", &self.user_id)
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

impl LedgerSession {
    /// Load `user_id`'s ledger from `store`, or start a fresh one.
    ///
    /// # Errors
    /// Returns an error if the stored snapshot cannot be read, or
    /// [`StorageError::Inconsistent`] if it breaks the balance invariants.
    pub fn open(
        user_id: impl Into<String>,
        store: Arc<dyn LedgerStore>,
        catalog: Arc<Catalog>,
    ) -> Result<Self> {
        let user_id = user_id.into();
        let ledger = match store.load(&user_id)? {
            Some(state) if !state.is_consistent() => {
                return Err(StorageError::Inconsistent {
                    user_id,
                    total_xp: state.total_xp,
                    current_xp: state.current_xp,
                    level: state.level,
                }
                .into());
            }
            Some(state) => Ledger::from_state(state, catalog),
            None => {
                tracing::debug!(user_id = %user_id, "no stored ledger, starting fresh");
                Ledger::new(catalog)
            }
        };
        Ok(Self {
            user_id,
            ledger,
            store,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn mutate<T>(&mut self, f: impl FnOnce(&mut Ledger) -> T) -> Result<T> {
        let mut next = self.ledger.clone();
        let out = f(&mut next);
        if next.state() != self.ledger.state() {
            self.store.save(&self.user_id, next.state())?;
        }
        self.ledger = next;
        Ok(out)
    }

    /// # Errors
    /// Invalid amounts or a failed save.
    pub fn earn_xp(&mut self, amount: i64, source: &str) -> Result<Vec<UnlockedAchievement>> {
        self.earn_xp_at(amount, source, Utc::now())
    }

    /// # Errors
    /// Invalid amounts or a failed save.
    pub fn earn_xp_at(
        &mut self,
        amount: i64,
        source: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<UnlockedAchievement>> {
        Ok(self.mutate(|l| l.earn_xp_at(amount, source, now))??)
    }

    /// # Errors
    /// Invalid amounts or a failed save.
    pub fn spend_xp(&mut self, amount: i64) -> Result<bool> {
        Ok(self.mutate(|l| l.spend_xp(amount))??)
    }

    /// # Errors
    /// Unknown reward or a failed save.
    pub fn purchase_reward(&mut self, reward_id: &str) -> Result<bool> {
        self.purchase_reward_at(reward_id, Utc::now())
    }

    /// # Errors
    /// Unknown reward or a failed save.
    pub fn purchase_reward_at(&mut self, reward_id: &str, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.mutate(|l| l.purchase_reward_at(reward_id, now))??)
    }

    /// # Errors
    /// A failed save.
    pub fn consume_bonus_analysis(&mut self) -> Result<bool> {
        self.mutate(Ledger::consume_bonus_analysis)
    }

    /// # Errors
    /// A failed save.
    pub fn record_login(&mut self) -> Result<LoginOutcome> {
        self.record_login_at(Utc::now())
    }

    /// # Errors
    /// A failed save.
    pub fn record_login_at(&mut self, now: DateTime<Utc>) -> Result<LoginOutcome> {
        self.mutate(|l| l.record_login_at(now))
    }

    pub fn is_premium_trial_active(&self) -> bool {
        self.ledger.is_premium_trial_active()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.ledger.snapshot()
    }

    /// Merge an authoritative snapshot under the bigger-total-wins policy.
    ///
    /// The comparison uses the ledger as it is now, not as it was when the
    /// snapshot was sent.
    ///
    /// # Errors
    /// A malformed snapshot or a failed save.
    pub fn apply_remote(
        &mut self,
        remote: &Snapshot,
        now: DateTime<Utc>,
    ) -> Result<(MergeDecision, Vec<UnlockedAchievement>)> {
        remote.validate()?;
        let decision = decide_merge(&self.ledger.snapshot(), remote);
        if decision == MergeDecision::UseLocal {
            return Ok((decision, Vec::new()));
        }

        tracing::info!(
            user_id = %self.user_id,
            local_total = self.ledger.state().total_xp,
            remote_total = remote.total_xp,
            "adopting authoritative snapshot"
        );
        let unlocked = self.mutate(|l| l.adopt_snapshot(remote, now))?;
        Ok((decision, unlocked))
    }

    /// Administrative reset: delete the stored ledger and start over.
    ///
    /// # Errors
    /// A failed delete.
    pub fn reset(&mut self) -> Result<bool> {
        let deleted = self.store.delete(&self.user_id)?;
        self.ledger = Ledger::new(self.ledger.shared_catalog());
        tracing::info!(user_id = %self.user_id, deleted, "ledger reset");
        Ok(deleted)
    }
}
