//! Reconciliation with the configured authority.

use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use xpledger_core::{Config, ReconciliationClient, SyncReport};

use super::context::open_session;

pub fn run(
    config: &Config,
    user: Option<String>,
    watch_mode: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !config.sync.enabled {
        return Err("sync is disabled: run `xpledger config set sync.enabled true`".into());
    }
    let client = ReconciliationClient::from_config(&config.sync)?;
    let session = Arc::new(Mutex::new(open_session(config, user)?));

    if watch_mode {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        return runtime.block_on(watch_loop(config, client, session));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(client.sync(&session));
    tracing::debug!(?report, "sync finished");

    match report {
        SyncReport::Adopted {
            previous_total_xp,
            total_xp,
            unlocked,
        } => {
            println!("Adopted server ledger: {previous_total_xp} -> {total_xp} XP");
            for id in unlocked {
                println!("Achievement unlocked: {id}");
            }
        }
        SyncReport::KeptLocal { total_xp } => {
            println!("Local ledger kept ({total_xp} XP)");
        }
        SyncReport::Skipped { reason } => {
            println!("Sync skipped, local ledger unchanged: {reason}");
        }
    }
    Ok(())
}

async fn watch_loop(
    config: &Config,
    client: ReconciliationClient,
    session: Arc<Mutex<xpledger_core::LedgerSession>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let interval = config.sync.interval();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    println!("Syncing every {}s, Ctrl-C to stop", interval.as_secs());
    let worker = tokio::spawn({
        let session = Arc::clone(&session);
        async move { client.run_periodic(session, interval, shutdown_rx).await }
    });

    tokio::signal::ctrl_c().await?;
    let _ = shutdown_tx.send(true);
    worker.await?;

    let total = session.lock().await.ledger().state().total_xp;
    println!("Stopped. Local ledger at {total} XP");
    Ok(())
}
