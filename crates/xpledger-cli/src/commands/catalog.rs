//! Read-only views of the economy catalog.

use clap::Subcommand;
use xpledger_core::{Config, EffectType};

#[derive(Subcommand)]
pub enum CatalogAction {
    /// List rank tiers
    Ranks {
        #[arg(long)]
        json: bool,
    },
    /// List achievements and their thresholds
    Achievements {
        #[arg(long)]
        json: bool,
    },
    /// List redeemable rewards
    Rewards {
        #[arg(long)]
        json: bool,
    },
}

pub fn run(config: &Config, action: CatalogAction) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = config.catalog()?;
    match action {
        CatalogAction::Ranks { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(catalog.ranks())?);
                return Ok(());
            }
            for rank in catalog.ranks() {
                let range = match rank.max_xp {
                    Some(max) => format!("{}-{}", rank.min_xp, max),
                    None => format!("{}+", rank.min_xp),
                };
                println!("{:<10} {:<12} {}", rank.id, range, rank.benefits.join(", "));
            }
        }
        CatalogAction::Achievements { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(catalog.achievements())?);
                return Ok(());
            }
            for a in catalog.achievements() {
                println!("{:>6} XP  {:<16} {}", a.required_xp, a.id, a.description);
            }
        }
        CatalogAction::Rewards { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(catalog.rewards())?);
                return Ok(());
            }
            for r in catalog.rewards() {
                let effect = match r.effect {
                    EffectType::AnalysisCredit => format!("+{} analysis credit(s)", r.magnitude),
                    EffectType::PremiumTrial => format!("{} day(s) premium", r.magnitude),
                };
                println!("{:<18} {:>5} XP  {}", r.id, r.cost, effect);
            }
        }
    }
    Ok(())
}
