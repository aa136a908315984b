//! `docsweep status`

use anyhow::{Context, Result};
use clap::Args;
use docsweep_storage::{Bucket, LogClient};

use crate::config::{BucketArgs, StoreArgs};

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Log to report on
    #[arg(long, env = "DOCSWEEP_LOG", default_value = "MyStream")]
    pub log: String,

    #[command(flatten)]
    pub buckets: BucketArgs,
}

pub async fn run(store: &StoreArgs, args: StatusArgs) -> Result<()> {
    let stores = store.open()?;
    let (staging, destination) = args.buckets.open(&stores)?;

    match stores.log().open(&args.log).await {
        Ok(cursor) => println!("log          {} (oldest offset {})", args.log, cursor.position()),
        Err(e) => println!("log          {} ({})", args.log, e),
    }
    println!("staged       {}", describe(&staging).await?);
    println!("published    {}", describe(&destination).await?);
    Ok(())
}

async fn describe(bucket: &Bucket) -> Result<String> {
    if !bucket.exists().await? {
        return Ok(format!("{}: bucket does not exist", bucket.name()));
    }
    let keys = bucket
        .list_keys()
        .await
        .with_context(|| format!("Failed to list bucket '{}'", bucket.name()))?;
    Ok(format!("{}: {} documents", bucket.name(), keys.len()))
}
