//! In-memory log.
//!
//! Keeps each log's single partition as a vector of records. Supports
//! [`MemoryLog::trim`] to drop old records, which moves the trim horizon the
//! way retention does on a hosted log.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use docsweep_core::LogRecord;
use tokio::sync::Mutex;

use super::{now_millis, Cursor, LogClient, PollBatch, DEFAULT_PARTITION};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct Partition {
    /// Retained records, offsets ascending and contiguous.
    records: Vec<LogRecord>,
    next_offset: u64,
}

impl Partition {
    fn horizon(&self) -> u64 {
        self.records
            .first()
            .map(|r| r.offset)
            .unwrap_or(self.next_offset)
    }
}

/// Log held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    logs: Mutex<HashMap<String, Partition>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every record below `offset`. Returns the number dropped.
    pub async fn trim(&self, log_name: &str, offset: u64) -> Result<usize> {
        let mut logs = self.logs.lock().await;
        let partition = logs
            .get_mut(log_name)
            .ok_or_else(|| unavailable(log_name))?;
        let before = partition.records.len();
        partition.records.retain(|r| r.offset >= offset);
        Ok(before - partition.records.len())
    }

    /// Number of retained records in the log.
    pub async fn len(&self, log_name: &str) -> usize {
        self.logs
            .lock()
            .await
            .get(log_name)
            .map(|p| p.records.len())
            .unwrap_or(0)
    }
}

fn unavailable(log_name: &str) -> Error {
    Error::PartitionUnavailable {
        log: log_name.to_string(),
        partition: DEFAULT_PARTITION,
    }
}

#[async_trait]
impl LogClient for MemoryLog {
    async fn open(&self, log_name: &str) -> Result<Cursor> {
        let logs = self.logs.lock().await;
        let partition = logs.get(log_name).ok_or_else(|| unavailable(log_name))?;
        Ok(Cursor::new(log_name, DEFAULT_PARTITION, partition.horizon()))
    }

    async fn poll(&self, cursor: &Cursor, max_records: usize) -> Result<PollBatch> {
        let logs = self.logs.lock().await;
        let partition = logs
            .get(cursor.log())
            .ok_or_else(|| unavailable(cursor.log()))?;

        // A cursor behind the horizon resumes at the oldest retained record.
        let start = cursor.position().max(partition.horizon());
        let records: Vec<LogRecord> = partition
            .records
            .iter()
            .filter(|r| r.offset >= start)
            .take(max_records)
            .cloned()
            .collect();

        let next_cursor = match records.last() {
            Some(last) => cursor.advanced_to(last.offset + 1),
            None => cursor.advanced_to(start),
        };
        Ok(PollBatch {
            records,
            next_cursor,
        })
    }

    async fn append(&self, log_name: &str, value: Bytes) -> Result<u64> {
        let mut logs = self.logs.lock().await;
        let partition = logs
            .get_mut(log_name)
            .ok_or_else(|| unavailable(log_name))?;
        let offset = partition.next_offset;
        partition
            .records
            .push(LogRecord::new(offset, now_millis(), value));
        partition.next_offset += 1;
        Ok(offset)
    }

    async fn create_log(&self, log_name: &str) -> Result<bool> {
        let mut logs = self.logs.lock().await;
        if logs.contains_key(log_name) {
            return Ok(false);
        }
        logs.insert(log_name.to_string(), Partition::default());
        tracing::info!(log = %log_name, "Log created");
        Ok(true)
    }
}
