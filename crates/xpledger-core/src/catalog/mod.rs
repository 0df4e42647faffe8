//! Static economy tables: achievements, ranks and rewards.
//!
//! A [`Catalog`] can only be built through [`Catalog::new`], which validates
//! the tables (rank partitioning, positive costs, unique ids). Every later
//! lookup can therefore assume the structure holds.

mod builtin;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::CatalogError;

/// Longest premium trial a single reward may grant, in days.
pub const MAX_TRIAL_DAYS: u32 = 36_500;

/// A permanent, one-time unlock triggered by lifetime XP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub required_xp: u64,
}

/// A named tier covering an inclusive XP range.
///
/// `max_xp` is `None` only for the top tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rank {
    pub id: String,
    pub name: String,
    pub min_xp: u64,
    #[serde(default)]
    pub max_xp: Option<u64>,
    #[serde(default)]
    pub benefits: Vec<String>,
}

impl Rank {
    /// Whether `xp` falls inside this rank's inclusive range.
    pub fn contains(&self, xp: u64) -> bool {
        xp >= self.min_xp && self.max_xp.map_or(true, |max| xp <= max)
    }
}

/// What a reward does once purchased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    /// Adds `magnitude` bonus analysis credits
    AnalysisCredit,
    /// Extends the premium trial by `magnitude` days
    PremiumTrial,
}

/// A purchasable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cost: u64,
    pub effect: EffectType,
    pub magnitude: u32,
}

/// On-disk shape of a catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogTables {
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default)]
    pub ranks: Vec<Rank>,
    #[serde(default)]
    pub rewards: Vec<RewardDefinition>,
}

/// Validated, immutable economy tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    achievements: Vec<Achievement>,
    ranks: Vec<Rank>,
    rewards: Vec<RewardDefinition>,
}

impl Catalog {
    /// Build a catalog, rejecting any structural problem.
    ///
    /// Ranks are sorted by `min_xp` before the partition check; achievements
    /// by `required_xp`.
    ///
    /// # Errors
    /// Returns a [`CatalogError`] describing the first violation found.
    pub fn new(tables: CatalogTables) -> Result<Self, CatalogError> {
        let CatalogTables {
            mut achievements,
            mut ranks,
            rewards,
        } = tables;

        ranks.sort_by_key(|r| r.min_xp);
        validate_ranks(&ranks)?;
        unique_ids("achievement", achievements.iter().map(|a| a.id.as_str()))?;
        unique_ids("reward", rewards.iter().map(|r| r.id.as_str()))?;

        for reward in &rewards {
            if reward.cost == 0 {
                return Err(CatalogError::ZeroCost(reward.id.clone()));
            }
            if reward.magnitude == 0 {
                return Err(CatalogError::ZeroMagnitude(reward.id.clone()));
            }
            if reward.effect == EffectType::PremiumTrial && reward.magnitude > MAX_TRIAL_DAYS {
                return Err(CatalogError::TrialTooLong {
                    id: reward.id.clone(),
                    days: reward.magnitude,
                    max: MAX_TRIAL_DAYS,
                });
            }
        }

        achievements.sort_by_key(|a| a.required_xp);

        Ok(Self {
            achievements,
            ranks,
            rewards,
        })
    }

    /// The tables shipped with the product.
    pub fn builtin() -> Self {
        // The built-in tables are covered by tests; failing here would be a
        // compile-time data bug.
        match Self::new(builtin::tables()) {
            Ok(catalog) => catalog,
            Err(e) => panic!("built-in catalog is invalid: {e}"),
        }
    }

    /// Parse and validate a TOML catalog.
    ///
    /// # Errors
    /// Returns [`CatalogError::ParseFailed`] on malformed TOML, or any
    /// validation error.
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let tables: CatalogTables =
            toml::from_str(content).map_err(|e| CatalogError::ParseFailed(e.to_string()))?;
        Self::new(tables)
    }

    /// Load a TOML catalog from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or fails validation.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::ParseFailed(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Achievements ordered by threshold.
    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    /// Ranks ordered from lowest to highest tier.
    pub fn ranks(&self) -> &[Rank] {
        &self.ranks
    }

    pub fn rewards(&self) -> &[RewardDefinition] {
        &self.rewards
    }

    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn reward(&self, id: &str) -> Option<&RewardDefinition> {
        self.rewards.iter().find(|r| r.id == id)
    }

    /// Serialize back into the file shape.
    pub fn to_tables(&self) -> CatalogTables {
        CatalogTables {
            achievements: self.achievements.clone(),
            ranks: self.ranks.clone(),
            rewards: self.rewards.clone(),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_ranks(ranks: &[Rank]) -> Result<(), CatalogError> {
    let first = ranks.first().ok_or(CatalogError::NoRanks)?;
    if first.min_xp != 0 {
        return Err(CatalogError::FirstRankNotZero {
            id: first.id.clone(),
            min_xp: first.min_xp,
        });
    }

    unique_ids("rank", ranks.iter().map(|r| r.id.as_str()))?;

    for (i, rank) in ranks.iter().enumerate() {
        let is_top = i + 1 == ranks.len();
        match rank.max_xp {
            Some(max) if max < rank.min_xp => {
                return Err(CatalogError::InvertedRange {
                    id: rank.id.clone(),
                    min_xp: rank.min_xp,
                    max_xp: max,
                });
            }
            Some(_) if is_top => return Err(CatalogError::BoundedTop(rank.id.clone())),
            None if !is_top => return Err(CatalogError::UnboundedBeforeTop(rank.id.clone())),
            _ => {}
        }
    }

    for pair in ranks.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        // Non-top ranks are bounded, checked above.
        let expected = match prev.max_xp {
            Some(max) => max
                .checked_add(1)
                .ok_or_else(|| CatalogError::NoRoomAbove(prev.id.clone()))?,
            None => return Err(CatalogError::UnboundedBeforeTop(prev.id.clone())),
        };
        if next.min_xp != expected {
            return Err(CatalogError::NotContiguous {
                previous: prev.id.clone(),
                next: next.id.clone(),
                expected,
                found: next.min_xp,
            });
        }
    }

    Ok(())
}

fn unique_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}
