//! The consumer loop.
//!
//! [`LogConsumer::run`] never returns `Ok`: it polls until an uncaught error
//! ends it. Callers that need to step the loop use [`LogConsumer::start`]
//! followed by [`LogConsumer::poll_once`].

use std::fmt;
use std::sync::Arc;

use docsweep_core::{count_words, LogRecord};
use docsweep_observability::metrics;
use docsweep_pipeline::{SweepOutcome, SweepTrigger};
use docsweep_storage::{Bucket, Cursor, LogClient, PollBatch};

use crate::config::{ConsumerConfig, PollRetryPolicy};
use crate::error::{ConsumerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Init,
    Polling,
    Staging,
    Triggering,
    Terminated,
}

impl fmt::Display for ConsumerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsumerState::Init => write!(f, "init"),
            ConsumerState::Polling => write!(f, "polling"),
            ConsumerState::Staging => write!(f, "staging"),
            ConsumerState::Triggering => write!(f, "triggering"),
            ConsumerState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Running totals since the consumer started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub polls: u64,
    pub empty_polls: u64,
    /// Records staged successfully.
    pub records: u64,
    /// Words in the staged records.
    pub words: u64,
    /// Records skipped because they could not be staged.
    pub skipped: u64,
    pub sweeps_completed: u64,
    pub sweeps_failed: u64,
}

pub struct LogConsumer {
    config: ConsumerConfig,
    log: Arc<dyn LogClient>,
    staging: Bucket,
    trigger: Arc<dyn SweepTrigger>,
    state: ConsumerState,
    stats: ConsumerStats,
}

impl LogConsumer {
    pub fn new(
        config: ConsumerConfig,
        log: Arc<dyn LogClient>,
        staging: Bucket,
        trigger: Arc<dyn SweepTrigger>,
    ) -> Self {
        Self {
            config,
            log,
            staging,
            trigger,
            state: ConsumerState::Init,
            stats: ConsumerStats::default(),
        }
    }

    pub fn state(&self) -> ConsumerState {
        self.state
    }

    pub fn stats(&self) -> &ConsumerStats {
        &self.stats
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// Run the consumer until a fatal error.
    pub async fn run(&mut self) -> Result<()> {
        let mut cursor = self.start().await?;
        loop {
            cursor = self.poll_once(&cursor).await?;
        }
    }

    /// Wait out the startup delay, provision the staging bucket and open the
    /// log at its trim horizon.
    pub async fn start(&mut self) -> Result<Cursor> {
        let result = self.open().await;
        self.settle(result)
    }

    async fn open(&mut self) -> Result<Cursor> {
        let delay = self.config.startup_delay();
        if !delay.is_zero() {
            tracing::info!(delay_ms = delay.as_millis() as u64, "Waiting before opening log");
            tokio::time::sleep(delay).await;
        }

        self.staging.ensure_exists().await?;

        let log_name = self.config.log_name.clone();
        let cursor = self.log.open(&log_name).await.map_err(|source| {
            if matches!(source, docsweep_storage::Error::PartitionUnavailable { .. }) {
                ConsumerError::PartitionUnavailable {
                    log: log_name.clone(),
                    source,
                }
            } else {
                ConsumerError::Storage(source)
            }
        })?;

        tracing::info!(
            log = %log_name,
            cursor = %cursor,
            staging_bucket = %self.staging.name(),
            "Consumer started"
        );
        self.state = ConsumerState::Polling;
        Ok(cursor)
    }

    /// One iteration of the loop: poll once, then either sleep (empty batch)
    /// or stage and sweep every record. Returns the cursor to poll next.
    pub async fn poll_once(&mut self, cursor: &Cursor) -> Result<Cursor> {
        let result = self.step(cursor).await;
        self.settle(result)
    }

    async fn step(&mut self, cursor: &Cursor) -> Result<Cursor> {
        self.state = ConsumerState::Polling;
        let batch = self.poll(cursor).await?;

        if !batch.next_cursor.follows(cursor) {
            return Err(ConsumerError::CursorRegression {
                previous: cursor.to_string(),
                next: batch.next_cursor.to_string(),
            });
        }

        let log_label = [cursor.log()];
        self.stats.polls += 1;
        metrics::CONSUMER_POLLS_TOTAL.with_label_values(&log_label).inc();

        if batch.is_empty() {
            self.stats.empty_polls += 1;
            metrics::CONSUMER_EMPTY_POLLS_TOTAL
                .with_label_values(&log_label)
                .inc();
            tracing::debug!(cursor = %cursor, "No new records, backing off");
            tokio::time::sleep(self.config.poll_backoff()).await;
            return Ok(batch.next_cursor);
        }

        metrics::CONSUMER_RECORDS_TOTAL
            .with_label_values(&log_label)
            .inc_by(batch.records.len() as u64);

        for record in &batch.records {
            if self.stage(cursor.log(), record).await? {
                self.trigger_sweep().await?;
            }
        }

        tracing::info!(
            records = self.stats.records,
            words = self.stats.words,
            "Processed records"
        );
        self.state = ConsumerState::Polling;
        Ok(batch.next_cursor)
    }

    /// Poll, retrying transient failures when the policy allows it.
    async fn poll(&self, cursor: &Cursor) -> Result<PollBatch> {
        let mut attempt = 0;
        loop {
            let err = match self.log.poll(cursor, self.config.max_poll_records).await {
                Ok(batch) => {
                    if attempt > 0 {
                        tracing::debug!(attempt = attempt + 1, "Poll succeeded after retry");
                    }
                    return Ok(batch);
                }
                Err(e) => e,
            };

            match &self.config.retry {
                PollRetryPolicy::Retry(policy) if err.is_transient() && attempt < policy.max_retries => {
                    let backoff = policy.backoff(attempt);
                    tracing::warn!(
                        cursor = %cursor,
                        attempt = attempt + 1,
                        max_retries = policy.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "Poll failed, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                _ => {
                    return Err(ConsumerError::UnrecoverablePoll {
                        cursor: cursor.to_string(),
                        source: err,
                    });
                }
            }
        }
    }

    /// Decode and stage one record. Returns `Ok(false)` when staging failed
    /// and the record was skipped. A record that is not a document is fatal.
    async fn stage(&mut self, log: &str, record: &LogRecord) -> Result<bool> {
        self.state = ConsumerState::Staging;

        let doc = record.decode().map_err(|source| ConsumerError::Decode {
            offset: record.offset,
            source,
        })?;
        let words = count_words(&doc.content);

        match self.staging.put_document(&doc).await {
            Ok(key) => {
                tracing::debug!(offset = record.offset, id = %doc.id, key = %key, words, "Staged document");
                self.stats.records += 1;
                self.stats.words += words;
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(offset = record.offset, id = %doc.id, error = %e, "Failed to stage document");
                metrics::STAGING_FAILURES_TOTAL
                    .with_label_values(&[log, "stage"])
                    .inc();
                self.stats.skipped += 1;
                Ok(false)
            }
        }
    }

    /// Start a sweep and wait for it. Only a sweep that cannot be started is
    /// fatal.
    async fn trigger_sweep(&mut self) -> Result<()> {
        self.state = ConsumerState::Triggering;
        match self.trigger.trigger().await? {
            SweepOutcome::Completed(_) => {
                self.stats.sweeps_completed += 1;
            }
            SweepOutcome::Failed(reason) => {
                tracing::error!(reason = %reason, "Sweep failed");
                self.stats.sweeps_failed += 1;
            }
        }
        Ok(())
    }

    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            tracing::error!(state = %self.state, error = %e, "Consumer terminated");
            self.state = ConsumerState::Terminated;
        }
        result
    }
}
