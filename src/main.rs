//! Reeltape CLI - Reel-to-Reel Tape Machine
//!
//! Command-line interface for the Reeltape engine.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;

use reeltape::cli::commands::{self, RenderOptions};
use reeltape::cli::{Cli, Commands};
use reeltape::DeckConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Reeltape v{}", env!("CARGO_PKG_VERSION"));

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Some(cmd) => handle_command(&config, cmd),
        None => {
            println!("Reeltape v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(config: &DeckConfig, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Info { file } => commands::info(config, &file),
        Commands::Render {
            files,
            seconds,
            rate,
            gain,
            start,
            output,
            bits,
        } => commands::render(
            config,
            &files,
            &output,
            RenderOptions {
                seconds,
                rate,
                gain_db: gain,
                start,
                bits,
            },
        ),
        Commands::Reverse { file, output } => commands::reverse(config, &file, &output),
        Commands::Record { from, output } => commands::record(config, &from, &output),
    }
}
