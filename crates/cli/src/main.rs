//! Ledgerline CLI - session and ledger operations from the command line
//!
//! Usage:
//! ```bash
//! ledgerline init
//! ledgerline login CUST_001
//! ledgerline validate <token>
//! ledgerline account create --owner CUST_001 --type checking
//! ledgerline fund <account-id> 50.00 --owner CUST_001 --source ach
//! ledgerline history <account-id> --owner CUST_001
//! ledgerline sweep --every 60
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::future::Future;
use std::path::PathBuf;

mod commands;
mod db;

use commands::{account, audit, funding, session};

/// Ledgerline - session lifecycle and account ledger core
#[derive(Parser)]
#[command(name = "ledgerline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database file path
    #[arg(long, default_value = "data/ledgerline.db", global = true)]
    pub db: PathBuf,

    /// Session lifetime in seconds
    #[arg(long, default_value_t = 7 * 24 * 3600, global = true)]
    pub session_ttl: i64,

    /// Maximum concurrent sessions per owner
    #[arg(long, default_value_t = 1, global = true)]
    pub max_sessions: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize database with schema
    Init {
        /// Force re-initialization (drops existing data)
        #[arg(long)]
        force: bool,
    },

    /// Show database status
    Status,

    /// Issue a session for an owner and enforce the session limit
    Login {
        /// Owner ID
        owner: String,
    },

    /// Validate a session token
    Validate {
        token: String,
    },

    /// Invalidate a session token
    Logout {
        token: String,
    },

    /// List active sessions of an owner
    Sessions {
        owner: String,
    },

    /// Remove expired sessions
    Sweep {
        /// Keep sweeping every N seconds until Ctrl-C
        #[arg(long)]
        every: Option<u64>,
    },

    /// Account management
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },

    /// Deposit funds into an account
    Fund {
        /// Account ID
        account_id: String,
        /// Amount to deposit
        amount: Decimal,
        /// Calling owner
        #[arg(long)]
        owner: String,
        /// Funding source label
        #[arg(long, default_value = "manual")]
        source: String,
    },

    /// Show the ledger of an account, newest first
    History {
        account_id: String,
        #[arg(long)]
        owner: String,
    },

    /// Check cached balances against the ledger
    Audit {
        /// Account ID (all accounts of --owner when omitted)
        account_id: Option<String>,
        #[arg(long)]
        owner: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AccountAction {
    /// Create a new account
    Create {
        #[arg(long)]
        owner: String,
        #[arg(long, short = 't', default_value = "checking")]
        r#type: AccountTypeArg,
    },
    /// List accounts of an owner
    List {
        #[arg(long)]
        owner: String,
    },
    /// Show account details
    Show {
        account_id: String,
        #[arg(long)]
        owner: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum AccountTypeArg {
    Checking,
    Savings,
}

impl AccountTypeArg {
    pub fn to_core_type(&self) -> ledgerline_core::AccountType {
        match self {
            AccountTypeArg::Checking => ledgerline_core::AccountType::Checking,
            AccountTypeArg::Savings => ledgerline_core::AccountType::Savings,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Ensure data directory exists
    if let Some(parent) = cli.db.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    if let Commands::Init { force } = cli.command {
        db::init_database(&cli.db, force).await?;
        println!("✅ Database initialized at {:?}", cli.db);
        return Ok(());
    }

    let database = db::connect(&cli.db).await?;
    let result = match cli.command {
        // The periodic sweeper handles Ctrl-C itself and reports its total.
        Commands::Sweep { every: Some(_) } => run(&cli, &database).await,
        _ => until_interrupted(run(&cli, &database), ctrl_c()).await,
    };
    // Release the pool on every exit path, including command errors and Ctrl-C.
    database.close().await;
    result
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Run `work` unless `signal` fires first
async fn until_interrupted<F, S>(work: F, signal: S) -> Result<()>
where
    F: Future<Output = Result<()>>,
    S: Future<Output = ()>,
{
    tokio::select! {
        result = work => result,
        _ = signal => {
            tracing::warn!("Interrupted, closing database");
            anyhow::bail!("interrupted")
        }
    }
}

async fn run(cli: &Cli, database: &ledgerline_persistence::Database) -> Result<()> {
    let session_config = ledgerline_business::SessionConfig {
        ttl_secs: cli.session_ttl,
        max_sessions_per_owner: cli.max_sessions,
        ..Default::default()
    };

    match &cli.command {
        Commands::Init { .. } => unreachable!("handled before connecting"),

        Commands::Status => db::show_status(database).await?,

        Commands::Login { owner } => session::login(database, session_config, owner).await?,

        Commands::Validate { token } => session::validate(database, session_config, token).await?,

        Commands::Logout { token } => session::logout(database, session_config, token).await?,

        Commands::Sessions { owner } => session::list(database, session_config, owner).await?,

        Commands::Sweep { every } => session::sweep(database, session_config, *every).await?,

        Commands::Account { action } => account::handle(database, action).await?,

        Commands::Fund {
            account_id,
            amount,
            owner,
            source,
        } => funding::fund(database, account_id, *amount, source, owner).await?,

        Commands::History { account_id, owner } => {
            funding::history(database, account_id, owner).await?
        }

        Commands::Audit { account_id, owner } => {
            audit::run_audit(database, account_id.as_deref(), owner.as_deref()).await?
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_until_interrupted_returns_work_result() {
        let result = until_interrupted(async { Ok(()) }, std::future::pending()).await;
        assert!(result.is_ok());

        let result =
            until_interrupted(async { anyhow::bail!("boom") }, std::future::pending()).await;
        assert_eq!(result.unwrap_err().to_string(), "boom");
    }

    #[tokio::test]
    async fn test_until_interrupted_stops_on_signal() {
        let work = async {
            std::future::pending::<()>().await;
            Ok(())
        };
        let result = until_interrupted(work, async {}).await;
        assert_eq!(result.unwrap_err().to_string(), "interrupted");
    }
}
