mod commands;
mod logging;
mod render;
mod source;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use orgcal_core::SyncConfig;

#[derive(Parser)]
#[command(name = "orgcal")]
#[command(version, about = "Sync events from an org-mode outline to a remote calendar")]
struct Cli {
    /// Config file [default: ~/.config/orgcal/config.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Compute and log changes without sending them
    #[arg(short, long, global = true)]
    dry: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Bring the calendar in line with the org file (default)
    Sync,
    /// Show what a sync would change
    Status,
    /// List the events found in the org file
    Events,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = load_config(cli.config)?;

    match cli.command.unwrap_or(Commands::Sync) {
        Commands::Sync => commands::sync::run(&config, cli.dry).await,
        Commands::Status => commands::status::run(&config).await,
        Commands::Events => commands::events::run(&config).await,
    }
}

fn load_config(path: Option<PathBuf>) -> Result<SyncConfig> {
    let path = match path {
        Some(path) => path,
        None => SyncConfig::default_path()?,
    };
    tracing::trace!("Loading config from {}...", path.display());

    SyncConfig::load(&path).with_context(|| format!("Failed to load {}", path.display()))
}
