//! docsweep CLI
//!
//! ## Commands
//!
//! - `listen`: run the log consumer; every staged document triggers a sweep
//! - `sweep`: run one Collect/Transform/Publish sweep and exit
//! - `produce`: append JSON documents to a log
//! - `status`: show what is staged and published
//!
//! ## Quick Start
//!
//! ```bash
//! # Append two documents (one JSON object per line)
//! printf '%s\n' '{"id":"r1","content":"hello world"}' \
//!               '{"id":"r2","content":"one two three"}' | docsweep produce
//!
//! # Consume them, sweeping each into my-bucket
//! docsweep listen --startup-delay-secs 0
//!
//! docsweep status
//! ```
//!
//! ## Configuration
//!
//! Every option falls back to an environment variable:
//! - `DOCSWEEP_STORE`: `memory`, `local` (default) or `s3`
//! - `DOCSWEEP_LOCAL_ROOT`: root directory of the local store
//! - `DOCSWEEP_S3_BUCKET`, `S3_ENDPOINT`, `AWS_REGION`, `AWS_ACCESS_KEY_ID`,
//!   `AWS_SECRET_ACCESS_KEY`: S3 settings
//! - `DOCSWEEP_LOG`, `DOCSWEEP_STAGING_BUCKET`, `DOCSWEEP_DESTINATION_BUCKET`
//! - `DOCSWEEP_POLL_BACKOFF_SECS`, `DOCSWEEP_STARTUP_DELAY_SECS`
//!
//! Log verbosity follows `RUST_LOG` (default: `info`).

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

use config::StoreArgs;

#[derive(Parser)]
#[command(name = "docsweep")]
#[command(about = "Stage documents from a log and sweep them into a destination bucket", long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Consume the log, staging and sweeping every document
    Listen(commands::listen::ListenArgs),
    /// Run one sweep over the staging bucket
    Sweep(commands::sweep::SweepArgs),
    /// Append JSON documents to a log
    Produce(commands::produce::ProduceArgs),
    /// Show staged and published document counts
    Status(commands::status::StatusArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Listen(args) => commands::listen::run(&cli.store, args).await,
        Commands::Sweep(args) => commands::sweep::run(&cli.store, args).await,
        Commands::Produce(args) => commands::produce::run(&cli.store, args).await,
        Commands::Status(args) => commands::status::run(&cli.store, args).await,
    }
}
