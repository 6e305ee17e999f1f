use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tinysteps::config::Config;
use tinysteps::store::ProgressStore;

mod cli;

#[derive(Parser)]
#[command(name = "tinysteps")]
#[command(about = "Tinysteps - progress, badges and graduation for early learners")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.tinysteps/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the progress database (defaults to ~/.tinysteps/progress.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Load and validate the badge catalog and curriculum table
    Validate,

    /// Show the variant config used for a mode at an age
    Resolve {
        #[arg(long)]
        mode: String,
        #[arg(long)]
        age: u8,
        /// Fail instead of falling back to the nearest age band
        #[arg(long)]
        exact: bool,
    },

    /// Create a learner at an age-year
    Enroll {
        #[arg(long)]
        user: String,
        #[arg(long)]
        age: u8,
    },

    /// Record a completed activity from a JSON file
    Record {
        #[arg(long)]
        user: String,
        /// ActivityEvent JSON file
        #[arg(long)]
        session: PathBuf,
    },

    /// Show a learner's progress
    Status {
        #[arg(long)]
        user: String,
    },

    /// Approve a pending graduation
    Approve {
        #[arg(long)]
        user: String,
        /// Name of the approving parent or teacher
        #[arg(long = "by")]
        approved_by: String,
        /// Age-year to approve (defaults to the active one)
        #[arg(long)]
        age: Option<u8>,
    },

    /// Decline a pending graduation
    Reject {
        #[arg(long)]
        user: String,
        #[arg(long)]
        age: Option<u8>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config;
    let db = cli.db.unwrap_or_else(ProgressStore::default_path);
    let load_config = || Config::load(config_path.as_deref());

    match cli.command {
        Commands::Init { force } => cli::init::init_command(config_path.as_deref(), force)?,
        Commands::Validate => cli::validate::validate_command(load_config()?)?,
        Commands::Resolve { mode, age, exact } => {
            cli::resolve::resolve_command(load_config()?, &mode, age, exact)?;
        }
        Commands::Enroll { user, age } => cli::learner::enroll_command(&db, &user, age)?,
        Commands::Record { user, session } => {
            cli::learner::record_command(load_config()?, &db, &user, &session)?;
        }
        Commands::Status { user } => cli::learner::status_command(load_config()?, &db, &user)?,
        Commands::Approve {
            user,
            approved_by,
            age,
        } => cli::graduation::approve_command(load_config()?, &db, &user, age, &approved_by)?,
        Commands::Reject { user, age } => {
            cli::graduation::reject_command(load_config()?, &db, &user, age)?;
        }
    }

    Ok(())
}
