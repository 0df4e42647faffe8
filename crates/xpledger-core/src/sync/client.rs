//! Reconciliation client.
//!
//! Pushes the local snapshot to the authority and merges the answer back.
//! The session lock is held only to read the snapshot and to merge, never
//! across the network round-trip, so local operations keep working while a
//! sync is in flight.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;

use crate::session::LedgerSession;
use crate::sync::authority::{HttpAuthority, RemoteAuthority};
use crate::sync::reconcile::MergeDecision;
use crate::sync::types::{Credential, SyncError, SyncReport};
use crate::storage::SyncConfig;

pub struct ReconciliationClient {
    authority: Arc<dyn RemoteAuthority>,
    credential: Credential,
}

impl ReconciliationClient {
    pub fn new(authority: Arc<dyn RemoteAuthority>, credential: Credential) -> Self {
        Self {
            authority,
            credential,
        }
    }

    /// Build an HTTP-backed client from configuration.
    ///
    /// # Errors
    /// [`SyncError::NotConfigured`] when no endpoint is set, or an invalid
    /// endpoint.
    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or_else(|| SyncError::NotConfigured("sync.endpoint is not set".to_string()))?;
        let authority = HttpAuthority::new(endpoint, config.timeout())?;
        let credential = Credential::new(config.token.clone().unwrap_or_default());
        Ok(Self::new(Arc::new(authority), credential))
    }

    /// Run one reconciliation cycle.
    ///
    /// Never fails: transport and merge problems are logged and reported as
    /// [`SyncReport::Skipped`].
    pub async fn sync(&self, session: &Mutex<LedgerSession>) -> SyncReport {
        let (user_id, local) = {
            let guard = session.lock().await;
            (guard.user_id().to_string(), guard.snapshot())
        };

        let remote = match self
            .authority
            .exchange(&user_id, &local, &self.credential)
            .await
        {
            Ok(remote) => remote,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "sync failed, keeping local ledger");
                return SyncReport::Skipped {
                    reason: e.to_string(),
                };
            }
        };

        let mut guard = session.lock().await;
        let previous_total_xp = guard.ledger().state().total_xp;
        match guard.apply_remote(&remote, Utc::now()) {
            Ok((MergeDecision::UseRemote, unlocked)) => SyncReport::Adopted {
                previous_total_xp,
                total_xp: guard.ledger().state().total_xp,
                unlocked: unlocked.into_iter().map(|u| u.achievement.id).collect(),
            },
            Ok((MergeDecision::UseLocal, _)) => {
                tracing::debug!(
                    user_id = %user_id,
                    local_total = previous_total_xp,
                    remote_total = remote.total_xp,
                    "local ledger is current"
                );
                SyncReport::KeptLocal {
                    total_xp: previous_total_xp,
                }
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "could not merge remote snapshot");
                SyncReport::Skipped {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Sync every `interval` until `shutdown` flips to `true` or its sender
    /// is dropped.
    pub async fn run_periodic(
        &self,
        session: Arc<Mutex<LedgerSession>>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.sync(&session).await;
                    tracing::debug!(?report, "periodic sync finished");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}
