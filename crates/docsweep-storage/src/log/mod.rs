//! Append-only, partitioned logs.
//!
//! ## Reading
//!
//! A reader calls [`LogClient::open`] once to get a [`Cursor`] at the oldest
//! retained record of the log's first partition (trim horizon), then calls
//! [`LogClient::poll`] repeatedly. `poll` never waits for data: an empty
//! [`PollBatch`] means nothing new has been appended yet.
//!
//! ```ignore
//! let mut cursor = log.open("MyStream").await?;
//! loop {
//!     let batch = log.poll(&cursor, 100).await?;
//!     for record in &batch.records {
//!         handle(record);
//!     }
//!     cursor = batch.next_cursor;
//! }
//! ```
//!
//! ## Cursors
//!
//! Cursors only move forward. `poll` returns a `next_cursor` positioned after
//! the last returned record, or at the same position when nothing was read.

pub mod memory;
pub mod object;

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use docsweep_core::LogRecord;

use crate::error::Result;

pub use memory::MemoryLog;
pub use object::ObjectStoreLog;

/// Partition read by consumers. Logs are read through a single partition.
pub const DEFAULT_PARTITION: u32 = 0;

/// Position of the next record to read in one log partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor {
    log: String,
    partition: u32,
    position: u64,
}

impl Cursor {
    pub fn new(log: impl Into<String>, partition: u32, position: u64) -> Self {
        Self {
            log: log.into(),
            partition,
            position,
        }
    }

    pub fn log(&self) -> &str {
        &self.log
    }

    pub fn partition(&self) -> u32 {
        self.partition
    }

    /// Offset of the next record this cursor will read.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Cursor moved to `position`, never backwards.
    pub fn advanced_to(&self, position: u64) -> Self {
        Self {
            log: self.log.clone(),
            partition: self.partition,
            position: self.position.max(position),
        }
    }

    /// Whether `self` is a valid successor of `previous`: same partition, not
    /// behind it.
    pub fn follows(&self, previous: &Cursor) -> bool {
        self.log == previous.log
            && self.partition == previous.partition
            && self.position >= previous.position
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.log, self.partition, self.position)
    }
}

/// Result of one poll.
#[derive(Debug, Clone)]
pub struct PollBatch {
    /// Records in offset order. Empty when nothing new is available.
    pub records: Vec<LogRecord>,
    pub next_cursor: Cursor,
}

impl PollBatch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Client for an append-only, partitioned log.
#[async_trait]
pub trait LogClient: Send + Sync {
    /// Open the log's partition at its trim horizon.
    ///
    /// Fails with [`crate::Error::PartitionUnavailable`] when the log or
    /// partition does not exist.
    async fn open(&self, log_name: &str) -> Result<Cursor>;

    /// Read up to `max_records` records at `cursor`. Never waits for data.
    async fn poll(&self, cursor: &Cursor, max_records: usize) -> Result<PollBatch>;

    /// Append a record to the log's partition, returning its offset.
    async fn append(&self, log_name: &str, value: Bytes) -> Result<u64>;

    /// Create the log and its partition if absent. Returns `true` if created.
    async fn create_log(&self, log_name: &str) -> Result<bool>;
}

/// Milliseconds since epoch, for record timestamps.
pub(crate) fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
