//! regledger CLI
//!
//! Operator tools for a registry data directory.
//!
//! # Commands
//!
//! - `inspect` - Show schema, row count and lock state of each ledger
//! - `verify` - Parse both ledgers and report damaged rows
//! - `search` - Fuzzy search birth records by child name
//! - `backups` - List pre-mutation snapshots
//! - `unlock` - Remove a stale lock marker

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use regledger_core::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// regledger command-line registry tools.
#[derive(Parser)]
#[command(name = "regledger")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the ledger files
    #[arg(global = true, short, long, default_value = "db")]
    data_dir: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show schema, row count and lock state of each ledger
    Inspect {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Parse both ledgers and report damaged rows
    Verify,

    /// Fuzzy search birth records by child name
    Search {
        /// Child name or surname
        name: String,

        /// Date of birth (YYYY-MM-DD) for an exact-match bonus
        #[arg(long)]
        dob: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// List pre-mutation snapshots
    Backups {
        /// Only list snapshots of this ledger
        #[arg(short, long, value_enum)]
        ledger: Option<LedgerName>,
    },

    /// Remove a stale lock marker left by a crashed writer
    Unlock {
        /// Only unlock this ledger
        #[arg(short, long, value_enum)]
        ledger: Option<LedgerName>,
    },

    /// Show version information
    Version,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

/// A ledger of the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LedgerName {
    /// User accounts
    Accounts,
    /// Birth records
    Births,
}

impl LedgerName {
    /// Both ledgers, in display order.
    pub const ALL: [LedgerName; 2] = [LedgerName::Accounts, LedgerName::Births];

    /// Selected ledgers: the given one, or both.
    pub fn selected(choice: Option<LedgerName>) -> Vec<LedgerName> {
        choice.map_or_else(|| Self::ALL.to_vec(), |l| vec![l])
    }

    /// Ledger file path under `config`.
    pub fn path(self, config: &Config) -> PathBuf {
        match self {
            LedgerName::Accounts => config.accounts_path(),
            LedgerName::Births => config.births_path(),
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            LedgerName::Accounts => "accounts",
            LedgerName::Births => "births",
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::default().with_data_dir(&cli.data_dir);

    match cli.command {
        Commands::Inspect { format } => commands::inspect::run(&config, format)?,
        Commands::Verify => commands::verify::run(&config)?,
        Commands::Search { name, dob, format } => {
            commands::search::run(&config, &name, dob.as_deref(), format)?;
        }
        Commands::Backups { ledger } => commands::backups::run(&config, ledger)?,
        Commands::Unlock { ledger } => commands::unlock::run(&config, ledger)?,
        Commands::Version => {
            println!("regledger CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("regledger core v{}", regledger_core::VERSION);
        }
    }

    Ok(())
}
