//! # Resgraph - Resolution Result Inspector
//!
//! Drives resgraph-core from TOML fixtures.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                 apps/resgraph (THE INSPECTOR)             │
//! │                                                           │
//! │   fixture.toml ──► GraphRecorder ──► SpillStore           │
//! │                                          │ done()         │
//! │   report ◄── ResultCache::load ◄── SpillHandle            │
//! │                                                           │
//! │   module.toml ──► ComponentMetadata::configuration        │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! resgraph replay fixtures/app.toml
//! resgraph --json --spill-threshold 0 replay fixtures/app.toml
//! resgraph configuration fixtures/module.toml test
//! ```

use clap::Parser;
use resgraph::cli;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Initialize tracing: RESGRAPH_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("RESGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = EnvFilter::try_from_env("RESGRAPH_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| "resgraph=info,resgraph_core=info".into());

    // Logs go to stderr so `--json` output stays parseable.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
