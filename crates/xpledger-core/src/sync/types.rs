//! Core types for ledger reconciliation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The complete field set exchanged with the authority.
///
/// Every field is required on the wire, `premium_trial_until` included (as
/// `null` when absent), so a truncated payload is rejected instead of
/// silently dropping fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub total_xp: u64,
    pub current_xp: u64,
    pub bonus_analysis_credits: u32,
    #[serde(deserialize_with = "required_option")]
    pub premium_trial_until: Option<DateTime<Utc>>,
    pub login_streak: u32,
    pub unlocked_achievement_ids: Vec<String>,
}

fn required_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<DateTime<Utc>>::deserialize(deserializer)
}

impl Snapshot {
    /// Reject snapshots that would break the balance invariant.
    ///
    /// # Errors
    /// [`SyncError::InvalidSnapshot`] if `current_xp > total_xp`.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.current_xp > self.total_xp {
            return Err(SyncError::InvalidSnapshot(format!(
                "current_xp {} exceeds total_xp {}",
                self.current_xp, self.total_xp
            )));
        }
        Ok(())
    }
}

/// Opaque credential handed through to the authority.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Outcome of one reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncReport {
    /// Remote had the larger total and replaced local balances
    Adopted {
        previous_total_xp: u64,
        total_xp: u64,
        unlocked: Vec<String>,
    },
    /// Local was at least as far along; nothing changed
    KeptLocal { total_xp: u64 },
    /// The cycle failed and was skipped
    Skipped { reason: String },
}

/// Sync error types.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authority responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Sync not configured: {0}")]
    NotConfigured(String),
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidEndpoint(err.to_string())
    }
}
