//! Ledger commands: balances, earning, spending, rewards, logins.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use xpledger_core::{Config, UnlockedAchievement};

use super::context::open_session;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Serialize)]
struct StatusView {
    user_id: String,
    total_xp: u64,
    current_xp: u64,
    level: u64,
    rank: String,
    next_rank: Option<String>,
    rank_progress_percent: u8,
    login_streak: u32,
    last_login_date: Option<NaiveDate>,
    premium_trial_active: bool,
    premium_trial_until: Option<DateTime<Utc>>,
    bonus_analysis_credits: u32,
    achievements_unlocked: usize,
}

fn print_unlocked(unlocked: &[UnlockedAchievement]) {
    for u in unlocked {
        println!("Achievement unlocked: {} ({})", u.achievement.name, u.achievement.id);
    }
}

pub fn status(config: &Config, user: Option<String>, json: bool) -> CmdResult {
    let session = open_session(config, user)?;
    let ledger = session.ledger();
    let state = ledger.state();

    let view = StatusView {
        user_id: session.user_id().to_string(),
        total_xp: state.total_xp,
        current_xp: state.current_xp,
        level: state.level,
        rank: ledger.current_rank()?.id.clone(),
        next_rank: ledger.next_rank()?.map(|r| r.id.clone()),
        rank_progress_percent: ledger.rank_progress_percent()?,
        login_streak: state.login_streak,
        last_login_date: state.last_login_date,
        premium_trial_active: ledger.is_premium_trial_active(),
        premium_trial_until: state.premium_trial_until,
        bonus_analysis_credits: state.bonus_analysis_credits,
        achievements_unlocked: state.unlocked_achievements.len(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("User:     {}", view.user_id);
    println!("XP:       {} spendable / {} lifetime", view.current_xp, view.total_xp);
    println!("Level:    {}", view.level);
    match &view.next_rank {
        Some(next) => println!(
            "Rank:     {} ({}% to {next})",
            view.rank, view.rank_progress_percent
        ),
        None => println!("Rank:     {} (top tier)", view.rank),
    }
    println!("Streak:   {} day(s)", view.login_streak);
    println!("Credits:  {}", view.bonus_analysis_credits);
    match view.premium_trial_until {
        Some(until) if view.premium_trial_active => println!("Premium:  active until {until}"),
        _ => println!("Premium:  inactive"),
    }
    println!("Achievements: {}", view.achievements_unlocked);
    Ok(())
}

pub fn earn(config: &Config, user: Option<String>, amount: i64, source: &str) -> CmdResult {
    let mut session = open_session(config, user)?;
    let unlocked = session.earn_xp(amount, source)?;
    let state = session.ledger().state();
    println!(
        "Earned {amount} XP ({source}). Balance: {} spendable / {} lifetime, level {}",
        state.current_xp, state.total_xp, state.level
    );
    print_unlocked(&unlocked);
    Ok(())
}

pub fn spend(config: &Config, user: Option<String>, amount: i64) -> CmdResult {
    let mut session = open_session(config, user)?;
    if session.spend_xp(amount)? {
        println!(
            "Spent {amount} XP. Balance: {}",
            session.ledger().state().current_xp
        );
    } else {
        println!(
            "Insufficient XP: need {amount}, have {}",
            session.ledger().state().current_xp
        );
    }
    Ok(())
}

pub fn buy(config: &Config, user: Option<String>, reward_id: &str) -> CmdResult {
    let mut session = open_session(config, user)?;
    if !session.purchase_reward(reward_id)? {
        let cost = session
            .ledger()
            .catalog()
            .reward(reward_id)
            .map(|r| r.cost)
            .unwrap_or_default();
        println!(
            "Insufficient XP for {reward_id}: costs {cost}, have {}",
            session.ledger().state().current_xp
        );
        return Ok(());
    }

    let state = session.ledger().state();
    println!("Purchased {reward_id}. Balance: {}", state.current_xp);
    if let Some(record) = state.purchase_history.last() {
        if let Some(expires) = record.expires_at {
            println!("Premium trial active until {expires}");
        }
    }
    if state.bonus_analysis_credits > 0 {
        println!("Bonus analysis credits: {}", state.bonus_analysis_credits);
    }
    Ok(())
}

pub fn consume(config: &Config, user: Option<String>) -> CmdResult {
    let mut session = open_session(config, user)?;
    if session.consume_bonus_analysis()? {
        println!(
            "Used one bonus analysis credit. Remaining: {}",
            session.ledger().state().bonus_analysis_credits
        );
    } else {
        println!("No bonus analysis credits left");
    }
    Ok(())
}

pub fn login(config: &Config, user: Option<String>) -> CmdResult {
    let mut session = open_session(config, user)?;
    let outcome = session.record_login()?;
    if outcome.xp_awarded == 0 {
        println!("Login already recorded today. Streak: {}", outcome.streak);
        return Ok(());
    }
    println!(
        "Login recorded. Streak: {} day(s), +{} XP",
        outcome.streak, outcome.xp_awarded
    );
    if let Some(days) = outcome.milestone {
        println!("{days}-day streak bonus!");
    }
    print_unlocked(&outcome.unlocked);
    Ok(())
}

pub fn history(config: &Config, user: Option<String>, json: bool) -> CmdResult {
    let session = open_session(config, user)?;
    let state = session.ledger().state();

    if json {
        let view = serde_json::json!({
            "purchases": state.purchase_history,
            "achievements": state.unlocked_achievements,
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("Purchases:");
    if state.purchase_history.is_empty() {
        println!("  (none)");
    }
    for p in &state.purchase_history {
        match p.expires_at {
            Some(expires) => println!("  {}  {}  (trial until {expires})", p.purchased_at, p.reward_id),
            None => println!("  {}  {}", p.purchased_at, p.reward_id),
        }
    }
    println!("Achievements:");
    if state.unlocked_achievements.is_empty() {
        println!("  (none)");
    }
    for (id, at) in &state.unlocked_achievements {
        println!("  {at}  {id}");
    }
    Ok(())
}

pub fn reset(config: &Config, user: Option<String>, yes: bool) -> CmdResult {
    if !yes {
        return Err("refusing to reset without --yes".into());
    }
    let mut session = open_session(config, user)?;
    if session.reset()? {
        println!("Ledger for {} deleted", session.user_id());
    } else {
        println!("No stored ledger for {}", session.user_id());
    }
    Ok(())
}
