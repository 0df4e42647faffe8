//! Daily login streak tracking.
//!
//! The streak is driven by a single event, a login at some instant. Only the
//! calendar day (UTC) matters.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Ledger;
use crate::resolver::UnlockedAchievement;

/// XP awarded for each new login day.
pub const DAILY_LOGIN_XP: u64 = 5;

/// Streak lengths that pay a one-shot bonus, with their reward and source label.
pub const STREAK_MILESTONES: [(u32, u64, &str); 2] =
    [(7, 50, "7day_streak"), (30, 200, "30day_streak")];

/// Where the streak currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "days")]
pub enum StreakState {
    NoPriorLogin,
    StreakActive(u32),
}

/// What a login does to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// Already recorded today
    NoOp,
    /// Consecutive day
    Continue,
    /// First login, missed days, or a clock that went backwards
    Reset,
}

/// Decide the transition for a login on `today`.
pub fn transition(last_login: Option<NaiveDate>, today: NaiveDate) -> StreakTransition {
    let Some(last) = last_login else {
        return StreakTransition::Reset;
    };
    match (today - last).num_days() {
        0 => StreakTransition::NoOp,
        1 => StreakTransition::Continue,
        // Gaps and clock skew both restart the streak.
        _ => StreakTransition::Reset,
    }
}

/// Result of [`Ledger::record_login`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub transition: StreakTransition,
    pub streak: u32,
    pub xp_awarded: u64,
    pub milestone: Option<u32>,
    pub unlocked: Vec<UnlockedAchievement>,
}

impl Ledger {
    pub fn streak_state(&self) -> StreakState {
        match self.state.last_login_date {
            Some(_) if self.state.login_streak > 0 => {
                StreakState::StreakActive(self.state.login_streak)
            }
            _ => StreakState::NoPriorLogin,
        }
    }

    /// Record a login now.
    pub fn record_login(&mut self) -> LoginOutcome {
        self.record_login_at(Utc::now())
    }

    /// Record a login at `now`.
    ///
    /// Repeated calls on the same day are no-ops.
    pub fn record_login_at(&mut self, now: DateTime<Utc>) -> LoginOutcome {
        let today = now.date_naive();
        let step = transition(self.state.last_login_date, today);

        if step == StreakTransition::NoOp {
            return LoginOutcome {
                transition: step,
                streak: self.state.login_streak,
                xp_awarded: 0,
                milestone: None,
                unlocked: Vec::new(),
            };
        }

        self.state.login_streak = match step {
            StreakTransition::Continue => self.state.login_streak.saturating_add(1),
            _ => 1,
        };
        self.state.last_login_date = Some(today);

        let mut unlocked = self.credit(DAILY_LOGIN_XP, "daily_login", now);
        let mut xp_awarded = DAILY_LOGIN_XP;
        let mut milestone = None;

        for (days, bonus, source) in STREAK_MILESTONES {
            if self.state.login_streak == days {
                tracing::info!(days, bonus, "login streak milestone reached");
                unlocked.extend(self.credit(bonus, source, now));
                xp_awarded += bonus;
                milestone = Some(days);
            }
        }

        tracing::debug!(streak = self.state.login_streak, ?step, "login recorded");

        LoginOutcome {
            transition: step,
            streak: self.state.login_streak,
            xp_awarded,
            milestone,
            unlocked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::ledger::{level_for, LedgerState};
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 9, 30, 0).unwrap()
    }

    fn ledger_with_streak(last: Option<NaiveDate>, streak: u32) -> Ledger {
        let state = LedgerState {
            last_login_date: last,
            login_streak: streak,
            ..Default::default()
        };
        Ledger::from_state(state, Arc::new(Catalog::builtin()))
    }

    #[test]
    fn first_login_starts_streak() {
        let mut l = ledger_with_streak(None, 0);
        assert_eq!(l.streak_state(), StreakState::NoPriorLogin);

        let out = l.record_login_at(now());
        assert_eq!(out.transition, StreakTransition::Reset);
        assert_eq!(out.streak, 1);
        assert_eq!(out.xp_awarded, DAILY_LOGIN_XP);
        assert_eq!(l.state().last_login_date, Some(now().date_naive()));
        assert_eq!(l.streak_state(), StreakState::StreakActive(1));
    }

    #[test]
    fn same_day_login_is_idempotent() {
        let mut l = ledger_with_streak(None, 0);
        l.record_login_at(now());
        let after_first = l.state().clone();

        let out = l.record_login_at(now() + Duration::hours(3));
        assert_eq!(out.transition, StreakTransition::NoOp);
        assert_eq!(out.xp_awarded, 0);
        assert_eq!(l.state(), &after_first);
    }

    #[test]
    fn consecutive_day_hits_seven_day_milestone() {
        let yesterday = now().date_naive() - Duration::days(1);
        let mut l = ledger_with_streak(Some(yesterday), 6);

        let out = l.record_login_at(now());
        assert_eq!(out.streak, 7);
        assert_eq!(out.milestone, Some(7));
        assert_eq!(out.xp_awarded, 55);
        assert_eq!(l.state().total_xp, 55);
        assert_eq!(l.state().level, level_for(55));
    }

    #[test]
    fn thirty_day_milestone_pays_two_hundred() {
        let yesterday = now().date_naive() - Duration::days(1);
        let mut l = ledger_with_streak(Some(yesterday), 29);

        let out = l.record_login_at(now());
        assert_eq!(out.streak, 30);
        assert_eq!(out.xp_awarded, 205);
    }

    #[test]
    fn gap_resets_without_bonus() {
        let three_days_ago = now().date_naive() - Duration::days(3);
        let mut l = ledger_with_streak(Some(three_days_ago), 10);

        let out = l.record_login_at(now());
        assert_eq!(out.transition, StreakTransition::Reset);
        assert_eq!(out.streak, 1);
        assert_eq!(out.milestone, None);
        assert_eq!(l.state().total_xp, 5);
    }

    #[test]
    fn clock_skew_resets_instead_of_failing() {
        let tomorrow = now().date_naive() + Duration::days(1);
        let mut l = ledger_with_streak(Some(tomorrow), 4);

        let out = l.record_login_at(now());
        assert_eq!(out.transition, StreakTransition::Reset);
        assert_eq!(l.state().login_streak, 1);
        assert_eq!(l.state().last_login_date, Some(now().date_naive()));
    }

    #[test]
    fn milestone_does_not_fire_past_equality() {
        let yesterday = now().date_naive() - Duration::days(1);
        let mut l = ledger_with_streak(Some(yesterday), 7);

        let out = l.record_login_at(now());
        assert_eq!(out.streak, 8);
        assert_eq!(out.milestone, None);
        assert_eq!(out.xp_awarded, DAILY_LOGIN_XP);
    }

    #[test]
    fn week_of_logins_pays_once() {
        let mut l = ledger_with_streak(None, 0);
        let mut total = 0;
        for day in 0..8 {
            total += l.record_login_at(now() + Duration::days(day)).xp_awarded;
        }
        assert_eq!(l.state().login_streak, 8);
        assert_eq!(total, 8 * DAILY_LOGIN_XP + 50);
    }

    #[test]
    fn transition_table() {
        let today = now().date_naive();
        assert_eq!(transition(None, today), StreakTransition::Reset);
        assert_eq!(transition(Some(today), today), StreakTransition::NoOp);
        assert_eq!(
            transition(Some(today - Duration::days(1)), today),
            StreakTransition::Continue
        );
        assert_eq!(
            transition(Some(today - Duration::days(2)), today),
            StreakTransition::Reset
        );
    }
}
