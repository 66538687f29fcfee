// Copyright 2026 Ofindex Contributors
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use ofindex::cli;
use ofindex::config::{
    BackendChoice, CollectorConfig, SupabaseCredentials, DEFAULT_DB_PATH,
};
use ofindex::error::CollectResult;

#[derive(Parser)]
#[command(
    name = "ofindex",
    about = "Ofindex — profile snapshot collector for the OnlyFans Economic Index",
    version,
    after_help = "Run 'ofindex <command> --help' for details on each command."
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Replay canned captures instead of driving a real browser
    #[arg(long, global = true)]
    mock: bool,

    /// Storage backend for snapshots
    #[arg(long, global = true, value_enum, default_value = "sqlite")]
    backend: Backend,

    /// SQLite database path (sqlite backend only)
    #[arg(long, global = true, default_value = DEFAULT_DB_PATH)]
    db_path: PathBuf,

    /// Page navigation timeout in seconds
    #[arg(long, global = true, default_value = "10")]
    nav_timeout: u64,

    /// How long to wait for a profile API response, in seconds
    #[arg(long, global = true, default_value = "30")]
    capture_timeout: u64,

    /// Navigation retries per target
    #[arg(long, global = true, default_value = "0")]
    retries: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Embedded SQLite database file
    Sqlite,
    /// Managed Supabase project over its REST API
    Supabase,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect one profile snapshot
    Collect {
        /// Target username
        username: String,
    },
    /// Collect snapshots for every username in a file
    Batch {
        /// File with one username per line
        file: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "ofindex=debug" } else { "ofindex=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_config(cli: &Cli) -> CollectResult<CollectorConfig> {
    let backend = match cli.backend {
        Backend::Sqlite => BackendChoice::Sqlite {
            db_path: cli.db_path.clone(),
        },
        Backend::Supabase => BackendChoice::Supabase(SupabaseCredentials::from_env()?),
    };

    let mut config = CollectorConfig::new(backend);
    config.use_mock = cli.mock;
    config.navigation_timeout = Duration::from_secs(cli.nav_timeout);
    config.capture_timeout = Duration::from_secs(cli.capture_timeout);
    config.retry.max_retries = cli.retries;
    Ok(config)
}

async fn dispatch(cli: &Cli) -> CollectResult<()> {
    match &cli.command {
        Commands::Collect { username } => {
            let config = build_config(cli)?;
            cli::collect_cmd::run(&config, username).await
        }
        Commands::Batch { file } => {
            let config = build_config(cli)?;
            cli::batch_cmd::run(&config, file).await
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "ofindex", &mut std::io::stdout());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = dispatch(&cli).await;

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
    Ok(())
}
