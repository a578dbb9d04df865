//! hindsight CLI — the main entry point.
//!
//! Commands:
//! - `ask`      — Assemble history context and run a completion over it
//! - `sessions` — List discovered session files
//! - `pricing`  — Show the built-in model pricing table
//! - `doctor`   — Diagnose configuration and data layout

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod report;

#[derive(Parser)]
#[command(
    name = "hindsight",
    about = "hindsight — ask questions over your conversation history",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble history context and run a completion over it
    Ask(commands::ask::AskArgs),

    /// List discovered session files, most recent first
    Sessions {
        /// Sessions directory (auto-detected if not specified)
        #[arg(long)]
        sessions_dir: Option<PathBuf>,

        /// Maximum sessions to list
        #[arg(long, default_value_t = 30)]
        limit: usize,
    },

    /// Show the built-in model pricing table
    Pricing,

    /// Diagnose configuration and data layout
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only the structured result.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ask(args) => commands::ask::run(args).await?,
        Commands::Sessions { sessions_dir, limit } => {
            commands::sessions::run(sessions_dir, limit).await?
        }
        Commands::Pricing => commands::pricing::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
