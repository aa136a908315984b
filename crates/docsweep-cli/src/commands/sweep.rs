//! `docsweep sweep`
//!
//! Exits 0 once the sweep reaches its end stage. A failed publish exits
//! non-zero, which a consumer using the command trigger logs as a failed
//! sweep.

use anyhow::{Context, Result};
use clap::Args;
use docsweep_pipeline::SweepPipeline;

use crate::config::{BucketArgs, StoreArgs};

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub buckets: BucketArgs,
}

pub async fn run(store: &StoreArgs, args: SweepArgs) -> Result<()> {
    docsweep_observability::init();

    let stores = store.open()?;
    let (staging, destination) = args.buckets.open(&stores)?;

    let report = SweepPipeline::new(staging, destination)
        .run()
        .await
        .context("Sweep failed")?;

    if !report.dropped.is_empty() {
        tracing::warn!(keys = ?report.dropped, "Dropped unreadable staged documents");
    }
    Ok(())
}
