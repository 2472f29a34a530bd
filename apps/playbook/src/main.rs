//! # P29 Playbook
//!
//! The main binary for the P29 compliance playbook.
//!
//! This application provides:
//! - CLI interface for assessment, timeline, progress and search
//! - Layered configuration (flags, playbook.toml, defaults)
//! - Snapshot export/import with BLAKE3 fingerprints
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │            apps/playbook (THE BINARY)         │
//! │                                               │
//! │   ┌─────────────┐        ┌────────────────┐   │
//! │   │    CLI      │        │    Config      │   │
//! │   │   (clap)    │        │    (toml)      │   │
//! │   └──────┬──────┘        └───────┬────────┘   │
//! │          └───────────┬───────────┘            │
//! │                      ▼                        │
//! │              ┌───────────────┐                │
//! │              │ playbook-core │                │
//! │              │  (THE LOGIC)  │                │
//! │              └───────────────┘                │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! playbook init
//! playbook assess answer gov-1 4
//! playbook timeline --fiscal-year-end march
//! playbook search "material controls"
//! ```

use clap::Parser;
use playbook::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing: PLAYBOOK_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("PLAYBOOK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "playbook=debug,playbook_core=debug"
    } else {
        "playbook=info,playbook_core=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

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

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the playbook banner.
fn print_banner() {
    println!(
        r#"
  ┌─┐┌─┐┌─┐  ┌─┐┬  ┌─┐┬ ┬┌┐ ┌─┐┌─┐┬┌─
  ├─┘┌─┘└─┤  ├─┘│  ├─┤└┬┘├┴┐│ ││ │├┴┐
  ┴  └─┘└─┘  ┴  ┴─┘┴ ┴ ┴ └─┘└─┘└─┘┴ ┴

  P29 Playbook v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
