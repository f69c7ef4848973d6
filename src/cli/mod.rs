//! CLI interface for strikegate
//!
//! Provides subcommands for:
//! - `run`: Start the paper trading engine
//! - `status`: Show current state
//! - `config`: Show the loaded configuration

mod run;

pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "strikegate")]
#[command(about = "Risk-gated trading engine for binary-outcome prediction markets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the paper trading engine
    Run(RunArgs),
    /// Show current state
    Status,
    /// Show the loaded configuration
    Config,
}
