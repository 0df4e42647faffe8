//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::process::Command;
use tempfile::TempDir;

/// Run a CLI command and return (code, stdout, stderr).
fn run_cli(home: &TempDir, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_xpledger"))
        .env("XPLEDGER_HOME", home.path())
        .env_remove("XPLEDGER_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn status_json(home: &TempDir) -> serde_json::Value {
    let (code, stdout, stderr) = run_cli(home, &["--user", "alice", "status", "--json"]);
    assert_eq!(code, 0, "status failed: {stderr}");
    serde_json::from_str(&stdout).expect("status --json is valid JSON")
}

#[test]
fn test_status_of_fresh_user() {
    let home = TempDir::new().unwrap();
    let status = status_json(&home);
    assert_eq!(status["total_xp"], 0);
    assert_eq!(status["level"], 1);
    assert_eq!(status["rank"], "bronze");
    assert_eq!(status["premium_trial_active"], false);
}

#[test]
fn test_missing_user_fails() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&home, &["status"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no user given"));
}

#[test]
fn test_earn_persists_between_runs() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&home, &["--user", "alice", "earn", "150"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Achievement unlocked: Getting Started") || stdout.contains("getting_started"));

    let status = status_json(&home);
    assert_eq!(status["total_xp"], 150);
    assert_eq!(status["current_xp"], 150);
    assert_eq!(status["level"], 2);
    assert_eq!(status["rank_progress_percent"], 50);
}

#[test]
fn test_zero_earn_is_rejected() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&home, &["--user", "alice", "earn", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
    assert_eq!(status_json(&home)["total_xp"], 0);
}

#[test]
fn test_negative_amounts_are_rejected() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["--user", "alice", "earn", "20"]);

    for cmd in ["earn", "spend"] {
        let (code, _, stderr) = run_cli(&home, &["--user", "alice", cmd, "-5"]);
        assert_eq!(code, 1, "{cmd} -5: {stderr}");
        assert!(stderr.contains("Invalid XP amount -5"));
    }
    let status = status_json(&home);
    assert_eq!(status["total_xp"], 20);
    assert_eq!(status["current_xp"], 20);
}

#[test]
fn test_overspend_leaves_balance() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["--user", "alice", "earn", "80"]);
    let (code, stdout, _) = run_cli(&home, &["--user", "alice", "spend", "100"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Insufficient XP"));
    assert_eq!(status_json(&home)["current_xp"], 80);
}

#[test]
fn test_buy_and_consume_credit() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["--user", "alice", "earn", "250"]);

    let (code, _, _) = run_cli(&home, &["--user", "alice", "buy", "extra_analysis_1"]);
    assert_eq!(code, 0);
    let status = status_json(&home);
    assert_eq!(status["current_xp"], 50);
    assert_eq!(status["total_xp"], 250);
    assert_eq!(status["bonus_analysis_credits"], 1);

    let (code, stdout, _) = run_cli(&home, &["--user", "alice", "consume"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Remaining: 0"));

    let (_, stdout, _) = run_cli(&home, &["--user", "alice", "history", "--json"]);
    let history: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(history["purchases"].as_array().unwrap().len(), 1);
}

#[test]
fn test_unknown_reward_fails() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&home, &["--user", "alice", "buy", "no_such_reward"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no_such_reward"));
}

#[test]
fn test_login_twice_same_day() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&home, &["--user", "alice", "login"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Streak: 1"));

    let (code, stdout, _) = run_cli(&home, &["--user", "alice", "login"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("already recorded"));
    assert_eq!(status_json(&home)["total_xp"], 5);
}

#[test]
fn test_users_are_isolated() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["--user", "bob", "earn", "40"]);
    assert_eq!(status_json(&home)["total_xp"], 0);
}

#[test]
fn test_reset_requires_confirmation() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["--user", "alice", "earn", "40"]);

    let (code, _, _) = run_cli(&home, &["--user", "alice", "reset"]);
    assert_eq!(code, 1);
    assert_eq!(status_json(&home)["total_xp"], 40);

    let (code, _, _) = run_cli(&home, &["--user", "alice", "reset", "--yes"]);
    assert_eq!(code, 0);
    assert_eq!(status_json(&home)["total_xp"], 0);
}

#[test]
fn test_catalog_rewards_json() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&home, &["catalog", "rewards", "--json"]);
    assert_eq!(code, 0);
    let rewards: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rewards.as_array().unwrap().len(), 5);
}

#[test]
fn test_config_user_id_is_default_user() {
    let home = TempDir::new().unwrap();
    let (code, _, _) = run_cli(&home, &["config", "set", "user_id", "carol"]);
    assert_eq!(code, 0);

    let (code, stdout, _) = run_cli(&home, &["config", "get", "user_id"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "carol");

    let (code, stdout, _) = run_cli(&home, &["status"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("carol"));
}

#[test]
fn test_config_get_unknown_key() {
    let home = TempDir::new().unwrap();
    let (code, _, _) = run_cli(&home, &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
}

#[test]
fn test_sync_without_endpoint_fails() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["config", "set", "sync.enabled", "true"]);
    let (code, _, stderr) = run_cli(&home, &["--user", "alice", "sync"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("endpoint"));
}

#[test]
fn test_unreachable_authority_skips_quietly() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["--user", "alice", "earn", "30"]);
    run_cli(&home, &["config", "set", "sync.enabled", "true"]);
    run_cli(&home, &["config", "set", "sync.endpoint", "http://127.0.0.1:9"]);
    run_cli(&home, &["config", "set", "sync.timeout_secs", "2"]);

    let (code, stdout, _) = run_cli(&home, &["--user", "alice", "sync"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Sync skipped"));
    assert_eq!(status_json(&home)["total_xp"], 30);
}
