mod commands;
mod discord;
mod render;
mod shutdown;
mod webcal;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use icalbot_core::config::BotConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "icalbot")]
#[command(about = "Announce new, changed and upcoming calendar events in Discord")]
struct Cli {
    /// Config file to use instead of ./icalbot.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log every decision, not just cycle summaries
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the calendars until interrupted
    Run,
    /// Run a single poll cycle and exit
    Once {
        /// Use a throwaway store, so every event is announced as new
        #[arg(long)]
        memory: bool,
    },
    /// Show which channel events of a category would be sent to
    Match {
        category: String,

        /// Only consider channels under this parent category
        #[arg(short, long)]
        parent: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let config = BotConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Run => commands::run::run(config).await,
        Commands::Once { memory } => commands::once::run(config, memory).await,
        Commands::Match { category, parent } => {
            commands::match_channel::run(config, &category, parent.as_deref()).await
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "icalbot=debug,icalbot_core=debug"
    } else {
        "icalbot=info,icalbot_core=info"
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
