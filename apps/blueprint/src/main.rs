//! # Blueprint - Architecture Diagram Editor
//!
//! The main binary for the blueprint editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │               apps/blueprint (THE BINARY)             │
//! │                                                       │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐  │
//! │  │    CLI      │   │  File Host  │   │   Config    │  │
//! │  │   (clap)    │   │ (save/exp.) │   │   (toml)    │  │
//! │  └──────┬──────┘   └──────┬──────┘   └──────┬──────┘  │
//! │         └─────────────────┼─────────────────┘         │
//! │                           ▼                           │
//! │                  ┌─────────────────┐                  │
//! │                  │ blueprint-core  │                  │
//! │                  │   (THE LOGIC)   │                  │
//! │                  └─────────────────┘                  │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! blueprint init -t "Shop"
//! blueprint add-node -t frontend --title "Web App" -x 100 -y 100
//! blueprint add-node -t api --title "Orders"
//! blueprint connect --from <web-id> --to <orders-id> -t api
//! blueprint report -o shop.md
//! ```

use blueprint::{cli, config};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // BLUEPRINT_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("BLUEPRINT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "blueprint=debug,blueprint_core=debug"
    } else if cli.quiet {
        "blueprint=warn,blueprint_core=warn"
    } else {
        "blueprint=info,blueprint_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so stdout stays clean for reports and JSON.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let result = config::load(cli.config.as_deref()).and_then(|config| cli::execute(cli, &config));

    if let Err(e) = result {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
