//! `docsweep listen`
//!
//! Runs the log consumer until a fatal error or a shutdown signal. A fatal
//! error exits non-zero; restarting is left to the operator.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use docsweep_consumer::{ConsumerConfig, LogConsumer, PollRetryPolicy, RetryPolicy};
use docsweep_pipeline::{CommandTrigger, InProcessTrigger, SweepPipeline, SweepTrigger};
use docsweep_storage::StoreBackend;

use crate::config::{BucketArgs, StoreArgs};

/// How each sweep is run.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// On the consumer's own task
    InProcess,
    /// As a `docsweep sweep` child process
    Command,
}

#[derive(Args, Debug, Clone)]
pub struct ListenArgs {
    /// Log to consume
    #[arg(long, env = "DOCSWEEP_LOG", default_value = "MyStream")]
    pub log: String,

    #[command(flatten)]
    pub buckets: BucketArgs,

    /// Seconds to sleep after an empty poll
    #[arg(long, env = "DOCSWEEP_POLL_BACKOFF_SECS", default_value_t = 5)]
    pub poll_backoff_secs: u64,

    /// Seconds to wait before opening the log
    #[arg(long, env = "DOCSWEEP_STARTUP_DELAY_SECS", default_value_t = 30)]
    pub startup_delay_secs: u64,

    /// Maximum records per poll
    #[arg(long, default_value_t = 100)]
    pub max_poll_records: usize,

    #[arg(long, value_enum, default_value_t = TriggerMode::InProcess)]
    pub trigger: TriggerMode,

    /// Retry transient poll errors instead of exiting on the first one
    #[arg(long)]
    pub retry_polls: bool,

    /// Retries per failed poll when --retry-polls is set
    #[arg(long, default_value_t = 5)]
    pub max_poll_retries: usize,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

impl ListenArgs {
    pub fn consumer_config(&self) -> ConsumerConfig {
        let retry = if self.retry_polls {
            PollRetryPolicy::Retry(RetryPolicy {
                max_retries: self.max_poll_retries,
                ..Default::default()
            })
        } else {
            PollRetryPolicy::FailStop
        };

        ConsumerConfig {
            log_name: self.log.clone(),
            staging_bucket: self.buckets.staging_bucket.clone(),
            destination_bucket: self.buckets.destination_bucket.clone(),
            poll_backoff_ms: self.poll_backoff_secs.saturating_mul(1_000),
            startup_delay_ms: self.startup_delay_secs.saturating_mul(1_000),
            max_poll_records: self.max_poll_records,
            retry,
        }
    }
}

pub async fn run(store: &StoreArgs, args: ListenArgs) -> Result<()> {
    docsweep_observability::init();

    if let Some(addr) = args.metrics_addr {
        serve_metrics(addr).await?;
    }

    let stores = store.open()?;
    let (staging, destination) = args.buckets.open(&stores)?;

    let trigger: Arc<dyn SweepTrigger> = match args.trigger {
        TriggerMode::InProcess => Arc::new(InProcessTrigger::new(SweepPipeline::new(
            staging.clone(),
            destination,
        ))),
        TriggerMode::Command => {
            if store.store == StoreBackend::Memory {
                tracing::warn!("Sweep processes cannot see the memory store; staged documents will not be published");
            }
            let mut child_args = store.to_args();
            child_args.push("sweep".to_string());
            child_args.extend(args.buckets.to_args());

            let mut trigger = CommandTrigger::current_exe(child_args)
                .context("Failed to locate the docsweep executable")?;
            if let Some(secret) = &store.secret_access_key {
                trigger = trigger.env("AWS_SECRET_ACCESS_KEY", secret.clone());
            }
            Arc::new(trigger)
        }
    };

    let config = args.consumer_config();
    tracing::info!(
        log = %config.log_name,
        staging_bucket = %config.staging_bucket,
        destination_bucket = %config.destination_bucket,
        trigger = ?args.trigger,
        "Starting consumer"
    );

    let mut consumer = LogConsumer::new(config, Arc::new(stores.log()), staging, trigger);

    let terminated = tokio::select! {
        result = consumer.run() => Some(result),
        _ = shutdown_signal() => None,
    };
    match terminated {
        Some(result) => result.context("Consumer terminated"),
        None => {
            tracing::info!(stats = ?consumer.stats(), "Shutting down consumer");
            Ok(())
        }
    }
}

async fn serve_metrics(addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind metrics address {}", addr))?;
    tracing::info!(addr = %addr, "Metrics server listening");

    tokio::spawn(async move {
        let app = docsweep_observability::exporter::create_metrics_router();
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "Metrics server stopped");
        }
    });
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT (Ctrl+C)"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        listen: ListenArgs,
    }

    #[test]
    fn test_consumer_config_from_args() {
        let h = Harness::try_parse_from([
            "listen",
            "--log",
            "orders",
            "--poll-backoff-secs",
            "2",
            "--startup-delay-secs",
            "0",
        ])
        .unwrap();
        let config = h.listen.consumer_config();
        assert_eq!(config.log_name, "orders");
        assert_eq!(config.poll_backoff_ms, 2_000);
        assert_eq!(config.startup_delay_ms, 0);
        assert_eq!(config.retry, PollRetryPolicy::FailStop);
        assert_eq!(h.listen.trigger, TriggerMode::InProcess);
    }

    #[test]
    fn test_huge_intervals_saturate() {
        let max = u64::MAX.to_string();
        let h = Harness::try_parse_from([
            "listen",
            "--poll-backoff-secs",
            max.as_str(),
            "--startup-delay-secs",
            max.as_str(),
        ])
        .unwrap();
        let config = h.listen.consumer_config();
        assert_eq!(config.poll_backoff_ms, u64::MAX);
        assert_eq!(config.startup_delay_ms, u64::MAX);
    }

    #[test]
    fn test_retry_polls_flag() {
        let h = Harness::try_parse_from([
            "listen",
            "--retry-polls",
            "--max-poll-retries",
            "2",
            "--trigger",
            "command",
        ])
        .unwrap();
        match h.listen.consumer_config().retry {
            PollRetryPolicy::Retry(policy) => assert_eq!(policy.max_retries, 2),
            other => panic!("expected retry policy, got {:?}", other),
        }
        assert_eq!(h.listen.trigger, TriggerMode::Command);
    }
}
