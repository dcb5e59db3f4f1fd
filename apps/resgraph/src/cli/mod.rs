//! # Resgraph CLI Module
//!
//! ## Available Commands
//!
//! - `replay` - Record a result fixture, seal it, materialize it once, print it
//! - `configuration` - Evaluate one configuration of a module fixture

mod commands;

use clap::{Parser, Subcommand};
use resgraph_core::GraphError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Resgraph - resolution result inspector
///
/// Replays described resolution outcomes through the binary result store
/// and the decode-once cache.
#[derive(Parser, Debug)]
#[command(name = "resgraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file with a `[store]` table
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Buffered bytes before the result store spills to disk (overrides config)
    #[arg(long, global = true)]
    pub spill_threshold: Option<u64>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record, seal and materialize a result fixture
    Replay {
        /// Path to the result fixture (TOML)
        fixture: PathBuf,
    },

    /// Show one configuration of a module fixture
    Configuration {
        /// Path to the module fixture (TOML)
        module: PathBuf,

        /// Configuration name
        name: String,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), GraphError> {
    let settings = Settings::load(cli.config.as_deref(), cli.spill_threshold)?;

    match cli.command {
        Commands::Replay { fixture } => cmd_replay(&settings, &fixture, cli.json),
        Commands::Configuration { module, name } => cmd_configuration(&module, &name, cli.json),
    }
}
