//! The XP ledger: balances, unlocks, purchases.
//!
//! [`Ledger`] is the only thing allowed to mutate a [`LedgerState`]. Every
//! operation either applies completely or leaves the state untouched.
//!
//! Running out of XP or credits is reported as `false`, not as an error.

pub mod streak;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::catalog::{Catalog, EffectType, Rank};
use crate::error::{CatalogError, LedgerError};
use crate::resolver::{self, UnlockedAchievement};
use crate::sync::Snapshot;

pub use streak::{LoginOutcome, StreakState};

/// XP needed per level.
pub const XP_PER_LEVEL: u64 = 100;

/// Level for a lifetime XP total.
pub fn level_for(total_xp: u64) -> u64 {
    total_xp / XP_PER_LEVEL + 1
}

/// One reward redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub reward_id: String,
    pub purchased_at: DateTime<Utc>,
    /// Trial expiry after this purchase; only set for premium trials
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Persisted per-user economy state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub total_xp: u64,
    pub current_xp: u64,
    pub level: u64,
    pub login_streak: u32,
    #[serde(default)]
    pub last_login_date: Option<NaiveDate>,
    #[serde(default)]
    pub premium_trial_until: Option<DateTime<Utc>>,
    pub bonus_analysis_credits: u32,
    #[serde(default)]
    pub unlocked_achievements: BTreeMap<String, DateTime<Utc>>,
    #[serde(default)]
    pub purchase_history: Vec<PurchaseRecord>,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            total_xp: 0,
            current_xp: 0,
            level: level_for(0),
            login_streak: 0,
            last_login_date: None,
            premium_trial_until: None,
            bonus_analysis_credits: 0,
            unlocked_achievements: BTreeMap::new(),
            purchase_history: Vec::new(),
        }
    }
}

impl LedgerState {
    /// Whether the balance and level invariants hold.
    pub fn is_consistent(&self) -> bool {
        self.current_xp <= self.total_xp && self.level == level_for(self.total_xp)
    }
}

/// Owner of a single user's [`LedgerState`].
#[derive(Debug, Clone)]
pub struct Ledger {
    state: LedgerState,
    catalog: Arc<Catalog>,
}

impl Ledger {
    /// A fresh ledger with zeroed state.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::from_state(LedgerState::default(), catalog)
    }

    /// Wrap previously persisted state.
    pub fn from_state(state: LedgerState, catalog: Arc<Catalog>) -> Self {
        Self { state, catalog }
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn shared_catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    /// Credit `amount` XP from `source`.
    ///
    /// Returns the achievements this earn unlocked.
    ///
    /// # Errors
    /// [`LedgerError::InvalidAmount`] if `amount <= 0`.
    pub fn earn_xp(
        &mut self,
        amount: i64,
        source: &str,
    ) -> Result<Vec<UnlockedAchievement>, LedgerError> {
        self.earn_xp_at(amount, source, Utc::now())
    }

    /// [`Ledger::earn_xp`] with an explicit clock.
    pub fn earn_xp_at(
        &mut self,
        amount: i64,
        source: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<UnlockedAchievement>, LedgerError> {
        let amount = positive(amount)?;
        Ok(self.credit(amount, source, now))
    }

    pub(crate) fn credit(
        &mut self,
        amount: u64,
        source: &str,
        now: DateTime<Utc>,
    ) -> Vec<UnlockedAchievement> {
        self.state.total_xp = self.state.total_xp.saturating_add(amount);
        self.state.current_xp = self.state.current_xp.saturating_add(amount);
        self.state.level = level_for(self.state.total_xp);

        tracing::debug!(
            amount,
            source,
            total_xp = self.state.total_xp,
            current_xp = self.state.current_xp,
            "earned xp"
        );

        self.unlock_crossed(now)
    }

    fn unlock_crossed(&mut self, now: DateTime<Utc>) -> Vec<UnlockedAchievement> {
        let unlocked = resolver::resolve_new_achievements(
            &self.catalog,
            self.state.total_xp,
            &self.state.unlocked_achievements,
            now,
        );
        for u in &unlocked {
            tracing::info!(achievement = %u.achievement.id, "achievement unlocked");
            self.state
                .unlocked_achievements
                .insert(u.achievement.id.clone(), u.unlocked_at);
        }
        unlocked
    }

    /// Debit `amount` from the spendable balance.
    ///
    /// Returns `false` with no change when the balance is too low.
    ///
    /// # Errors
    /// [`LedgerError::InvalidAmount`] if `amount <= 0`.
    pub fn spend_xp(&mut self, amount: i64) -> Result<bool, LedgerError> {
        let amount = positive(amount)?;
        Ok(self.debit(amount))
    }

    fn debit(&mut self, amount: u64) -> bool {
        if self.state.current_xp < amount {
            tracing::debug!(amount, current_xp = self.state.current_xp, "insufficient xp");
            return false;
        }
        self.state.current_xp -= amount;
        true
    }

    /// Redeem a catalog reward.
    ///
    /// # Errors
    /// [`LedgerError::UnknownReward`] if the id is not in the catalog.
    pub fn purchase_reward(&mut self, reward_id: &str) -> Result<bool, LedgerError> {
        self.purchase_reward_at(reward_id, Utc::now())
    }

    /// [`Ledger::purchase_reward`] with an explicit clock.
    ///
    /// # Errors
    /// [`LedgerError::UnknownReward`], or [`LedgerError::TrialOutOfRange`]
    /// when the extended trial would not fit in a timestamp. Nothing is
    /// debited in either case.
    pub fn purchase_reward_at(
        &mut self,
        reward_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        let reward = self
            .catalog
            .reward(reward_id)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownReward(reward_id.to_string()))?;

        let expires_at = match reward.effect {
            EffectType::AnalysisCredit => None,
            EffectType::PremiumTrial => {
                // Unused trial time carries over.
                let base = match self.state.premium_trial_until {
                    Some(until) if until > now => until,
                    _ => now,
                };
                let until = base
                    .checked_add_signed(Duration::days(i64::from(reward.magnitude)))
                    .ok_or_else(|| LedgerError::TrialOutOfRange(reward.id.clone()))?;
                Some(until)
            }
        };

        if !self.debit(reward.cost) {
            return Ok(false);
        }

        match expires_at {
            Some(until) => self.state.premium_trial_until = Some(until),
            None => {
                self.state.bonus_analysis_credits =
                    self.state.bonus_analysis_credits.saturating_add(reward.magnitude);
            }
        }

        self.state.purchase_history.push(PurchaseRecord {
            reward_id: reward.id.clone(),
            purchased_at: now,
            expires_at,
        });

        tracing::info!(
            reward = %reward.id,
            cost = reward.cost,
            current_xp = self.state.current_xp,
            "reward purchased"
        );
        Ok(true)
    }

    /// Use one bonus analysis credit.
    pub fn consume_bonus_analysis(&mut self) -> bool {
        if self.state.bonus_analysis_credits == 0 {
            return false;
        }
        self.state.bonus_analysis_credits -= 1;
        true
    }

    pub fn is_premium_trial_active(&self) -> bool {
        self.is_premium_trial_active_at(Utc::now())
    }

    pub fn is_premium_trial_active_at(&self, now: DateTime<Utc>) -> bool {
        self.state.premium_trial_until.is_some_and(|until| until > now)
    }

    /// # Errors
    /// See [`resolver::current_rank`].
    pub fn current_rank(&self) -> Result<&Rank, CatalogError> {
        resolver::current_rank(&self.catalog, self.state.total_xp)
    }

    /// # Errors
    /// See [`resolver::current_rank`].
    pub fn next_rank(&self) -> Result<Option<&Rank>, CatalogError> {
        let current = self.current_rank()?;
        Ok(resolver::next_rank(&self.catalog, current))
    }

    /// # Errors
    /// See [`resolver::current_rank`].
    pub fn rank_progress_percent(&self) -> Result<u8, CatalogError> {
        resolver::rank_progress_percent(&self.catalog, self.state.total_xp)
    }

    /// The field set exchanged during reconciliation.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            total_xp: self.state.total_xp,
            current_xp: self.state.current_xp,
            bonus_analysis_credits: self.state.bonus_analysis_credits,
            premium_trial_until: self.state.premium_trial_until,
            login_streak: self.state.login_streak,
            unlocked_achievement_ids: self.state.unlocked_achievements.keys().cloned().collect(),
        }
    }

    /// Overwrite balances with an authoritative snapshot.
    ///
    /// The caller decides whether the snapshot should win; this only applies
    /// it. Achievements crossed by the adopted total are unlocked.
    pub(crate) fn adopt_snapshot(
        &mut self,
        remote: &Snapshot,
        now: DateTime<Utc>,
    ) -> Vec<UnlockedAchievement> {
        self.state.total_xp = remote.total_xp;
        self.state.current_xp = remote.current_xp;
        self.state.bonus_analysis_credits = remote.bonus_analysis_credits;
        self.state.premium_trial_until = remote.premium_trial_until;
        self.state.level = level_for(self.state.total_xp);
        self.unlock_crossed(now)
    }
}

fn positive(amount: i64) -> Result<u64, LedgerError> {
    u64::try_from(amount)
        .ok()
        .filter(|a| *a > 0)
        .ok_or(LedgerError::InvalidAmount(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ledger() -> Ledger {
        Ledger::new(Arc::new(Catalog::builtin()))
    }

    fn ledger_with_xp(xp: u64) -> Ledger {
        let state = LedgerState {
            total_xp: xp,
            current_xp: xp,
            level: level_for(xp),
            ..Default::default()
        };
        Ledger::from_state(state, Arc::new(Catalog::builtin()))
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn fresh_state_defaults() {
        let l = ledger();
        assert_eq!(l.state().total_xp, 0);
        assert_eq!(l.state().level, 1);
        assert!(l.state().is_consistent());
        assert!(!l.is_premium_trial_active());
    }

    #[test]
    fn earn_updates_balances_level_and_rank() {
        let mut l = ledger();
        let unlocked = l.earn_xp_at(150, "x", t0()).unwrap();

        assert_eq!(l.state().total_xp, 150);
        assert_eq!(l.state().current_xp, 150);
        assert_eq!(l.state().level, 2);
        assert_eq!(l.current_rank().unwrap().id, "bronze");
        assert_eq!(l.rank_progress_percent().unwrap(), 50);
        assert_eq!(unlocked.len(), 2);
        assert_eq!(l.state().unlocked_achievements.len(), 2);
    }

    #[test]
    fn earn_rejects_non_positive() {
        let mut l = ledger();
        assert_eq!(l.earn_xp(0, "x"), Err(LedgerError::InvalidAmount(0)));
        assert_eq!(l.earn_xp(-5, "x"), Err(LedgerError::InvalidAmount(-5)));
        assert_eq!(l.state(), &LedgerState::default());
    }

    #[test]
    fn achievements_unlock_once() {
        let mut l = ledger();
        let first = l.earn_xp_at(10, "x", t0()).unwrap();
        assert_eq!(first.len(), 1);
        let second = l.earn_xp_at(10, "x", t0() + Duration::hours(1)).unwrap();
        assert!(second.is_empty());
        assert_eq!(l.state().unlocked_achievements["first_steps"], t0());
    }

    #[test]
    fn spend_insufficient_is_false_and_unchanged() {
        let mut l = ledger_with_xp(80);
        assert_eq!(l.spend_xp(100), Ok(false));
        assert_eq!(l.state().current_xp, 80);
    }

    #[test]
    fn spend_leaves_total_untouched() {
        let mut l = ledger_with_xp(80);
        assert_eq!(l.spend_xp(80), Ok(true));
        assert_eq!(l.state().current_xp, 0);
        assert_eq!(l.state().total_xp, 80);
    }

    #[test]
    fn spend_rejects_non_positive() {
        let mut l = ledger_with_xp(80);
        assert_eq!(l.spend_xp(0), Err(LedgerError::InvalidAmount(0)));
    }

    #[test]
    fn purchase_unknown_reward_fails() {
        let mut l = ledger_with_xp(10_000);
        assert_eq!(
            l.purchase_reward("nope"),
            Err(LedgerError::UnknownReward("nope".into()))
        );
        assert_eq!(l.state().current_xp, 10_000);
    }

    #[test]
    fn purchase_premium_trial_from_scratch() {
        let mut l = ledger_with_xp(1200);
        assert_eq!(l.purchase_reward_at("premium_3day", t0()), Ok(true));
        assert_eq!(l.state().current_xp, 0);
        assert_eq!(l.state().premium_trial_until, Some(t0() + Duration::days(3)));
        assert!(l.is_premium_trial_active_at(t0()));
        assert_eq!(l.state().purchase_history.len(), 1);
        assert_eq!(
            l.state().purchase_history[0].expires_at,
            Some(t0() + Duration::days(3))
        );
    }

    #[test]
    fn premium_trials_stack_while_active() {
        let mut l = ledger_with_xp(1700);
        assert_eq!(l.purchase_reward_at("premium_3day", t0()), Ok(true));
        assert_eq!(l.purchase_reward_at("premium_1day", t0()), Ok(true));
        assert_eq!(l.state().premium_trial_until, Some(t0() + Duration::days(4)));
        assert_eq!(l.state().current_xp, 0);
    }

    #[test]
    fn expired_trial_starts_fresh() {
        let mut l = ledger_with_xp(1000);
        assert_eq!(l.purchase_reward_at("premium_1day", t0()), Ok(true));
        let later = t0() + Duration::days(5);
        assert!(!l.is_premium_trial_active_at(later));
        assert_eq!(l.purchase_reward_at("premium_1day", later), Ok(true));
        assert_eq!(l.state().premium_trial_until, Some(later + Duration::days(1)));
    }

    #[test]
    fn trial_is_inactive_at_exact_expiry() {
        let mut l = ledger_with_xp(500);
        l.purchase_reward_at("premium_1day", t0()).unwrap();
        assert!(!l.is_premium_trial_active_at(t0() + Duration::days(1)));
    }

    #[test]
    fn failed_purchase_is_atomic() {
        let mut l = ledger_with_xp(100);
        let before = l.state().clone();
        assert_eq!(l.purchase_reward_at("premium_3day", t0()), Ok(false));
        assert_eq!(l.state(), &before);
    }

    #[test]
    fn trial_past_the_date_range_is_refused_without_debit() {
        let mut l = ledger_with_xp(1000);
        let mut remote = l.snapshot();
        remote.premium_trial_until = Some(DateTime::<Utc>::MAX_UTC - Duration::hours(1));
        l.adopt_snapshot(&remote, t0());
        let before = l.state().clone();

        assert_eq!(
            l.purchase_reward_at("premium_1day", t0()),
            Err(LedgerError::TrialOutOfRange("premium_1day".into()))
        );
        assert_eq!(l.state(), &before);
    }

    #[test]
    fn oversized_trial_from_custom_catalog_is_refused() {
        let mut tables = Catalog::builtin().to_tables();
        tables.rewards.push(crate::catalog::RewardDefinition {
            id: "century".into(),
            name: "Century".into(),
            description: String::new(),
            cost: 1,
            effect: EffectType::PremiumTrial,
            magnitude: crate::catalog::MAX_TRIAL_DAYS,
        });
        let catalog = Arc::new(Catalog::new(tables).unwrap());
        let state = LedgerState {
            total_xp: 10,
            current_xp: 10,
            premium_trial_until: Some(DateTime::<Utc>::MAX_UTC - Duration::days(10)),
            ..Default::default()
        };
        let mut l = Ledger::from_state(state, catalog);
        let before = l.state().clone();

        assert!(matches!(
            l.purchase_reward_at("century", t0()),
            Err(LedgerError::TrialOutOfRange(_))
        ));
        assert_eq!(l.state(), &before);
    }

    #[test]
    fn credit_purchase_and_consume() {
        let mut l = ledger_with_xp(800);
        assert_eq!(l.purchase_reward_at("extra_analysis_5", t0()), Ok(true));
        assert_eq!(l.state().bonus_analysis_credits, 5);
        assert_eq!(l.state().purchase_history[0].expires_at, None);

        for _ in 0..5 {
            assert!(l.consume_bonus_analysis());
        }
        assert!(!l.consume_bonus_analysis());
        assert_eq!(l.state().bonus_analysis_credits, 0);
    }

    #[test]
    fn snapshot_carries_unlocked_ids() {
        let mut l = ledger();
        l.earn_xp_at(100, "x", t0()).unwrap();
        let snap = l.snapshot();
        assert_eq!(snap.total_xp, 100);
        assert_eq!(
            snap.unlocked_achievement_ids,
            vec!["first_steps".to_string(), "getting_started".to_string()]
        );
    }

    #[test]
    fn state_serializes_with_optional_fields_missing() {
        let json = r#"{"total_xp":5,"current_xp":5,"level":1,"login_streak":0,"bonus_analysis_credits":0}"#;
        let state: LedgerState = serde_json::from_str(json).unwrap();
        assert!(state.purchase_history.is_empty());
        assert!(state.last_login_date.is_none());
    }
}
