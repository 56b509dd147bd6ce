use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bb_cli::commands::{departments, shell, types};
use bb_cli::{Cli, Commands, Config, build_service};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            let service = build_service(&config);
            shell::run(&service)?;
        }
        Commands::Types => {
            let service = build_service(&config);
            types::run(&service)?;
        }
        Commands::Departments => {
            let service = build_service(&config);
            departments::run(&service)?;
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
