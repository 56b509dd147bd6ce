//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Employee rest-break tracker.
///
/// Admits breaks against per-type concurrency caps, tracks a fixed daily
/// time budget, and reports per-user and per-department usage. State lives
/// in memory for the lifetime of the process.
#[derive(Debug, Parser)]
#[command(name = "bb", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the interactive break desk (the default).
    Shell,

    /// List configured break types and current capacity.
    Types,

    /// List configured departments.
    Departments,

    /// Print the resolved configuration as JSON.
    Config,
}
