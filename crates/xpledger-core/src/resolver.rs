//! Rank and achievement derivation.
//!
//! Everything here is a pure function of lifetime XP and the catalog.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::catalog::{Achievement, Catalog, Rank};
use crate::error::CatalogError;

/// An achievement crossed by the latest XP change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockedAchievement {
    pub achievement: Achievement,
    pub unlocked_at: DateTime<Utc>,
}

/// The rank whose inclusive range contains `total_xp`.
///
/// # Errors
/// Returns [`CatalogError::NoRankFor`] if no rank matches. A validated
/// catalog always has a match, so this signals a data-integrity bug.
pub fn current_rank(catalog: &Catalog, total_xp: u64) -> Result<&Rank, CatalogError> {
    catalog
        .ranks()
        .iter()
        .find(|r| r.contains(total_xp))
        .ok_or(CatalogError::NoRankFor(total_xp))
}

/// The tier directly above `current`, or `None` at the top.
pub fn next_rank<'a>(catalog: &'a Catalog, current: &Rank) -> Option<&'a Rank> {
    let ranks = catalog.ranks();
    let idx = ranks.iter().position(|r| r.id == current.id)?;
    ranks.get(idx + 1)
}

/// Progress through the current rank towards the next, 0..=100.
///
/// The top tier reports 100.
///
/// # Errors
/// Propagates [`current_rank`] failures.
pub fn rank_progress_percent(catalog: &Catalog, total_xp: u64) -> Result<u8, CatalogError> {
    let current = current_rank(catalog, total_xp)?;
    let Some(next) = next_rank(catalog, current) else {
        return Ok(100);
    };

    let span = next.min_xp.saturating_sub(current.min_xp);
    if span == 0 {
        return Ok(100);
    }
    let gained = total_xp.saturating_sub(current.min_xp);
    let pct = (100.0 * gained as f64 / span as f64).round();
    Ok(pct.clamp(0.0, 100.0) as u8)
}

/// Achievements reached by `total_xp` that are not in `already_unlocked`.
///
/// Each is stamped with `now`. Feeding the result back into
/// `already_unlocked` makes a second call return nothing.
pub fn resolve_new_achievements(
    catalog: &Catalog,
    total_xp: u64,
    already_unlocked: &BTreeMap<String, DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Vec<UnlockedAchievement> {
    catalog
        .achievements()
        .iter()
        .filter(|a| a.required_xp <= total_xp && !already_unlocked.contains_key(&a.id))
        .map(|a| UnlockedAchievement {
            achievement: a.clone(),
            unlocked_at: now,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_rank_at_boundaries() {
        let catalog = Catalog::builtin();
        assert_eq!(current_rank(&catalog, 0).unwrap().id, "bronze");
        assert_eq!(current_rank(&catalog, 150).unwrap().id, "bronze");
        assert_eq!(current_rank(&catalog, 299).unwrap().id, "bronze");
        assert_eq!(current_rank(&catalog, 300).unwrap().id, "silver");
        assert_eq!(current_rank(&catalog, 5_000).unwrap().id, "diamond");
        assert_eq!(current_rank(&catalog, u64::MAX).unwrap().id, "diamond");
    }

    #[test]
    fn next_rank_walks_catalog_order() {
        let catalog = Catalog::builtin();
        let bronze = current_rank(&catalog, 0).unwrap();
        assert_eq!(next_rank(&catalog, bronze).unwrap().id, "silver");

        let diamond = current_rank(&catalog, 9_999).unwrap();
        assert!(next_rank(&catalog, diamond).is_none());
    }

    #[test]
    fn progress_is_rounded_percentage_of_span() {
        let catalog = Catalog::builtin();
        assert_eq!(rank_progress_percent(&catalog, 0).unwrap(), 0);
        assert_eq!(rank_progress_percent(&catalog, 150).unwrap(), 50);
        // 1/300 rounds down, 2/300 rounds up to 1
        assert_eq!(rank_progress_percent(&catalog, 1).unwrap(), 0);
        assert_eq!(rank_progress_percent(&catalog, 2).unwrap(), 1);
        assert_eq!(rank_progress_percent(&catalog, 299).unwrap(), 100);
        // silver spans 300..1000
        assert_eq!(rank_progress_percent(&catalog, 650).unwrap(), 50);
    }

    #[test]
    fn progress_at_top_tier_is_full() {
        let catalog = Catalog::builtin();
        assert_eq!(rank_progress_percent(&catalog, 5_000).unwrap(), 100);
        assert_eq!(rank_progress_percent(&catalog, 123_456).unwrap(), 100);
    }

    #[test]
    fn resolves_only_crossed_and_new() {
        let catalog = Catalog::builtin();
        let now = Utc::now();
        let mut unlocked = BTreeMap::new();

        let first = resolve_new_achievements(&catalog, 150, &unlocked, now);
        let ids: Vec<_> = first.iter().map(|u| u.achievement.id.as_str()).collect();
        assert_eq!(ids, vec!["first_steps", "getting_started"]);
        assert!(first.iter().all(|u| u.unlocked_at == now));

        for u in first {
            unlocked.insert(u.achievement.id, u.unlocked_at);
        }
        assert!(resolve_new_achievements(&catalog, 150, &unlocked, now).is_empty());

        let later = resolve_new_achievements(&catalog, 600, &unlocked, now);
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].achievement.id, "analyst");
    }

    #[test]
    fn nothing_unlocks_at_zero() {
        let catalog = Catalog::builtin();
        assert!(resolve_new_achievements(&catalog, 0, &BTreeMap::new(), Utc::now()).is_empty());
    }
}
