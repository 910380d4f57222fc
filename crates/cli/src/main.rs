//! Tickmark CLI - Main Entry Point
//!
//! Runs TodoMVC verification scenarios against a live application and
//! reports pytest-style outcomes.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{check, init, list, run};

/// Exit status when the harness could not be set up
const EXIT_SETUP: u8 = 2;

/// Tickmark - settle-safe TodoMVC verification
#[derive(Parser)]
#[command(name = "tickmark")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Harness configuration file
    #[arg(long, env = "TICKMARK_CONFIG", default_value = "tickmark.toml", global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenario groups and write test-results.json
    Run(run::RunArgs),

    /// List scenarios without running them
    List(list::ListArgs),

    /// Write a default configuration file
    Init(init::InitArgs),

    /// Check that Node.js and Playwright are available
    Check,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Run(args) => run::execute(args, &cli.config, cli.format).await,
        Commands::List(args) => list::execute(args, &cli.config, cli.format).map(|_| ExitCode::SUCCESS),
        Commands::Init(args) => init::execute(args, &cli.config).map(|_| ExitCode::SUCCESS),
        Commands::Check => check::execute(&cli.config).await,
        Commands::Version => {
            println!("Tickmark v{}", env!("CARGO_PKG_VERSION"));
            println!("Settle-safe verification for TodoMVC-style applications");
            Ok(ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::from(EXIT_SETUP)
        }
    }
}
