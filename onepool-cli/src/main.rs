mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::CliConfig;
use onepool_core::Storage;
use onepool_lottery::LotteryError;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "onepool")]
#[command(about = "OnePool - single-bettor 1POOL lottery")]
#[command(version)]
struct Cli {
    /// Data directory for pool state
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy tokens, the distributor and a funded pool
    Init(commands::InitArgs),

    /// Mint fee tokens (BOG) to an account
    Faucet {
        /// Receiving account
        account: String,
        /// Amount in whole tokens, decimals allowed
        amount: String,
    },

    /// Transfer 1POOL between accounts (taxed)
    Transfer {
        from: String,
        to: String,
        amount: String,
    },

    /// Let the pool spend an account's tokens
    Approve {
        owner: String,
        /// Token to approve: stake or fee
        #[arg(value_enum)]
        token: commands::TokenKind,
        amount: String,
    },

    /// Top up the lottery fund with 1POOL
    Fund {
        from: String,
        amount: String,
    },

    /// Place a bet
    Play {
        player: String,
        amount: String,
        /// Resolve immediately with a commit-reveal draw
        #[arg(long)]
        auto: bool,
    },

    /// Deliver randomness for the pending round
    Resolve {
        /// Account delivering the value, defaults to the pool's oracle
        #[arg(long)]
        caller: Option<String>,
        /// Use this value instead of drawing one
        #[arg(long)]
        value: Option<u64>,
    },

    /// Show pool status
    Status,

    /// Stop the pool (admin)
    Stop {
        #[arg(long)]
        caller: Option<String>,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Resume a stopped pool (admin)
    Resume {
        #[arg(long)]
        caller: Option<String>,
    },

    /// Cancel a round that never received randomness (admin)
    Cancel {
        #[arg(long)]
        caller: Option<String>,
    },

    /// Show token balances of an account
    Balance { account: String },

    /// Show recent pool events
    Events {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "onepool={},onepool_lottery={},onepool_core={}",
            log_level, log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = CliConfig::default();
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    config.verbose = cli.verbose;

    tokio::fs::create_dir_all(&config.data_dir).await?;
    tracing::debug!("Using database {}", config.db_path().display());
    let storage = Storage::new(&config.db_path()).await?;

    let result = match cli.command {
        Commands::Init(args) => commands::init(&storage, args).await,
        Commands::Faucet { account, amount } => commands::faucet(&storage, &account, &amount).await,
        Commands::Transfer { from, to, amount } => {
            commands::transfer(&storage, &from, &to, &amount).await
        }
        Commands::Approve {
            owner,
            token,
            amount,
        } => commands::approve(&storage, &owner, token, &amount).await,
        Commands::Fund { from, amount } => commands::fund(&storage, &from, &amount).await,
        Commands::Play {
            player,
            amount,
            auto,
        } => commands::play(&storage, &player, &amount, auto).await,
        Commands::Resolve { caller, value } => commands::resolve(&storage, caller, value).await,
        Commands::Status => commands::status(&storage).await,
        Commands::Stop { caller, yes } => commands::stop(&storage, caller, yes).await,
        Commands::Resume { caller } => commands::resume(&storage, caller).await,
        Commands::Cancel { caller } => commands::cancel(&storage, caller).await,
        Commands::Balance { account } => commands::balance(&storage, &account).await,
        Commands::Events { limit } => commands::events(&storage, limit).await,
    };

    if let Err(e) = result {
        match e.downcast_ref::<LotteryError>() {
            Some(err) => {
                eprintln!("Error: {}", err.public_message());
                if config.verbose {
                    eprintln!("Reason: {}", err);
                }
            }
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }

    Ok(())
}
