//! `docsweep produce`
//!
//! Reads documents from a file (or stdin) and appends each to the log,
//! creating the log first if needed. Input is either one JSON array of
//! documents or one JSON document per line.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use clap::Args;
use docsweep_core::Document;
use docsweep_storage::LogClient;
use serde_json::Value;

use crate::config::StoreArgs;

#[derive(Args, Debug, Clone)]
pub struct ProduceArgs {
    /// Log to append to
    #[arg(long, env = "DOCSWEEP_LOG", default_value = "MyStream")]
    pub log: String,

    /// Input file; reads stdin when omitted
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

pub async fn run(store: &StoreArgs, args: ProduceArgs) -> Result<()> {
    let input = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    let payloads = parse_documents(&input)?;

    let log = store.open()?.log();
    log.create_log(&args.log)
        .await
        .with_context(|| format!("Failed to create log '{}'", args.log))?;

    for payload in payloads {
        let offset = log
            .append(&args.log, payload)
            .await
            .with_context(|| format!("Failed to append to log '{}'", args.log))?;
        println!("{}@{}", args.log, offset);
    }
    Ok(())
}

/// Split input into document payloads, rejecting anything that the consumer
/// could not decode.
fn parse_documents(input: &str) -> Result<Vec<Bytes>> {
    let trimmed = input.trim_start();
    let values: Vec<Value> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).context("Invalid JSON array")?
    } else {
        input
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).with_context(|| format!("Invalid JSON on line {}", n + 1))
            })
            .collect::<Result<_>>()?
    };

    let mut payloads = Vec::with_capacity(values.len());
    for (n, value) in values.into_iter().enumerate() {
        let body = serde_json::to_vec(&value)?;
        let doc = Document::from_slice(&body)
            .with_context(|| format!("Document {} is not a valid document", n + 1))?;
        if let Err(e) = doc.object_key() {
            bail!("Document {} cannot be stored: {}", n + 1, e);
        }
        payloads.push(Bytes::from(body));
    }
    Ok(payloads)
}
