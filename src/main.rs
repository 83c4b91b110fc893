//! # Shakesearch CLI (`shakesearch`)
//!
//! ## Usage
//!
//! ```bash
//! shakesearch [--config ./config/shakesearch.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shakesearch serve` | Index the corpus and start the HTTP server |
//! | `shakesearch search "<query>"` | Print one page of snippets |
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

use clap::{Parser, Subcommand};
use shakesearch::{config, search, server};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shakesearch — full-text search over a single static corpus.
#[derive(Parser)]
#[command(name = "shakesearch", version)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/shakesearch.toml` when present, otherwise
    /// built-in defaults are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Loads and indexes the corpus, then serves `/search`, `/health`, and
    /// the static front end. The `PORT` environment variable overrides
    /// `[server].port`.
    Serve,

    /// Search the corpus from the command line.
    Search {
        /// Case-insensitive regular expression.
        query: String,

        /// Number of matches already seen; prints the page after them.
        #[arg(long, default_value_t = 0)]
        existing: usize,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,shakesearch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Search { query, existing } => {
            search::run_search(&cfg, &query, existing)?;
        }
    }

    Ok(())
}
