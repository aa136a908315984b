//! Consumer configuration.
//!
//! Built once at startup. Every field has a default, so a partial JSON object
//! (or `ConsumerConfig::default()`) is a complete configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Log to consume (default: MyStream)
    #[serde(default = "default_log_name")]
    pub log_name: String,

    /// Bucket documents are staged in (default: temp)
    #[serde(default = "default_staging_bucket")]
    pub staging_bucket: String,

    /// Bucket sweeps publish to (default: my-bucket)
    #[serde(default = "default_destination_bucket")]
    pub destination_bucket: String,

    /// Sleep after an empty poll, in milliseconds (default: 5s)
    #[serde(default = "default_poll_backoff_ms")]
    pub poll_backoff_ms: u64,

    /// Sleep before opening the log, in milliseconds (default: 30s)
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,

    /// Maximum records requested per poll (default: 100)
    #[serde(default = "default_max_poll_records")]
    pub max_poll_records: usize,

    /// What to do when a poll fails (default: fail-stop)
    #[serde(default)]
    pub retry: PollRetryPolicy,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            log_name: default_log_name(),
            staging_bucket: default_staging_bucket(),
            destination_bucket: default_destination_bucket(),
            poll_backoff_ms: default_poll_backoff_ms(),
            startup_delay_ms: default_startup_delay_ms(),
            max_poll_records: default_max_poll_records(),
            retry: PollRetryPolicy::default(),
        }
    }
}

impl ConsumerConfig {
    pub fn poll_backoff(&self) -> Duration {
        Duration::from_millis(self.poll_backoff_ms)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}

fn default_log_name() -> String {
    "MyStream".to_string()
}

fn default_staging_bucket() -> String {
    "temp".to_string()
}

fn default_destination_bucket() -> String {
    "my-bucket".to_string()
}

fn default_poll_backoff_ms() -> u64 {
    5_000
}

fn default_startup_delay_ms() -> u64 {
    30_000
}

fn default_max_poll_records() -> usize {
    100
}

/// Handling of a failed poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PollRetryPolicy {
    /// Any poll error terminates the consumer.
    #[default]
    FailStop,
    /// Transient poll errors are retried with exponential backoff. Errors
    /// that are not transient, or outlast the retries, still terminate.
    Retry(RetryPolicy),
}

/// Exponential backoff settings.
///
/// ```text
/// backoff(attempt) = min(initial_backoff * multiplier^attempt, max_backoff)
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (0-indexed).
    pub fn backoff(&self, attempt: usize) -> Duration {
        let backoff_ms =
            self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(backoff_ms as u64).min(Duration::from_millis(self.max_backoff_ms))
    }
}

fn default_max_retries() -> usize {
    5
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}
