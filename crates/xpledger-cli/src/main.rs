use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "xpledger", version, about = "xpledger CLI")]
struct Cli {
    /// User whose ledger to operate on (defaults to config `user_id`)
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show balances, rank, streak and trial state
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Earn XP
    Earn {
        #[arg(allow_negative_numbers = true)]
        amount: i64,
        /// Label recorded with the earn
        #[arg(long, default_value = "manual")]
        source: String,
    },
    /// Spend XP from the spendable balance
    Spend {
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Redeem a reward from the catalog
    Buy { reward_id: String },
    /// Use one bonus analysis credit
    Consume,
    /// Record today's login
    Login,
    /// Purchase history and unlocked achievements
    History {
        #[arg(long)]
        json: bool,
    },
    /// Reconcile with the configured authority
    Sync {
        /// Keep syncing every `sync.interval_secs` until Ctrl-C
        #[arg(long)]
        watch: bool,
    },
    /// Delete the stored ledger for this user
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
    /// Inspect the economy catalog
    Catalog {
        #[command(subcommand)]
        action: commands::catalog::CatalogAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_env("XPLEDGER_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = match xpledger_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    init_logging(&config.log_level);

    let user = cli.user;
    let result = match cli.command {
        Commands::Status { json } => commands::ledger::status(&config, user, json),
        Commands::Earn { amount, source } => commands::ledger::earn(&config, user, amount, &source),
        Commands::Spend { amount } => commands::ledger::spend(&config, user, amount),
        Commands::Buy { reward_id } => commands::ledger::buy(&config, user, &reward_id),
        Commands::Consume => commands::ledger::consume(&config, user),
        Commands::Login => commands::ledger::login(&config, user),
        Commands::History { json } => commands::ledger::history(&config, user, json),
        Commands::Sync { watch } => commands::sync::run(&config, user, watch),
        Commands::Reset { yes } => commands::ledger::reset(&config, user, yes),
        Commands::Catalog { action } => commands::catalog::run(&config, action),
        Commands::Config { action } => commands::config::run(config, action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
