//! Built-in economy tables.

use super::{Achievement, CatalogTables, EffectType, Rank, RewardDefinition};

fn achievement(id: &str, name: &str, description: &str, icon: &str, required_xp: u64) -> Achievement {
    Achievement {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        required_xp,
    }
}

fn rank(id: &str, name: &str, min_xp: u64, max_xp: Option<u64>, benefits: &[&str]) -> Rank {
    Rank {
        id: id.to_string(),
        name: name.to_string(),
        min_xp,
        max_xp,
        benefits: benefits.iter().map(|b| b.to_string()).collect(),
    }
}

fn reward(
    id: &str,
    name: &str,
    description: &str,
    cost: u64,
    effect: EffectType,
    magnitude: u32,
) -> RewardDefinition {
    RewardDefinition {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        cost,
        effect,
        magnitude,
    }
}

pub(super) fn tables() -> CatalogTables {
    CatalogTables {
        achievements: vec![
            achievement("first_steps", "First Steps", "Earn your first 10 XP", "footprints", 10),
            achievement("getting_started", "Getting Started", "Reach 100 XP", "rocket", 100),
            achievement("analyst", "Analyst", "Reach 500 XP", "chart", 500),
            achievement("expert", "Expert", "Reach 1,000 XP", "star", 1_000),
            achievement("strategist", "Strategist", "Reach 2,500 XP", "compass", 2_500),
            achievement("master", "Master", "Reach 5,000 XP", "crown", 5_000),
            achievement("legend", "Legend", "Reach 10,000 XP", "trophy", 10_000),
        ],
        ranks: vec![
            rank("bronze", "Bronze", 0, Some(299), &["Basic dashboard"]),
            rank(
                "silver",
                "Silver",
                300,
                Some(999),
                &["Basic dashboard", "Weekly insights digest"],
            ),
            rank(
                "gold",
                "Gold",
                1_000,
                Some(2_499),
                &["Weekly insights digest", "Priority analysis queue"],
            ),
            rank(
                "platinum",
                "Platinum",
                2_500,
                Some(4_999),
                &["Priority analysis queue", "Early access features"],
            ),
            rank(
                "diamond",
                "Diamond",
                5_000,
                None,
                &["Early access features", "Dedicated support"],
            ),
        ],
        rewards: vec![
            reward(
                "extra_analysis_1",
                "Extra Analysis",
                "One additional analysis credit",
                200,
                EffectType::AnalysisCredit,
                1,
            ),
            reward(
                "extra_analysis_5",
                "Analysis Pack",
                "Five additional analysis credits",
                800,
                EffectType::AnalysisCredit,
                5,
            ),
            reward(
                "premium_1day",
                "Premium Day Pass",
                "One day of premium features",
                500,
                EffectType::PremiumTrial,
                1,
            ),
            reward(
                "premium_3day",
                "Premium Weekend",
                "Three days of premium features",
                1_200,
                EffectType::PremiumTrial,
                3,
            ),
            reward(
                "premium_7day",
                "Premium Week",
                "Seven days of premium features",
                2_500,
                EffectType::PremiumTrial,
                7,
            ),
        ],
    }
}
