//! Log persisted on an object store.
//!
//! Each record is one object, named by its zero-padded offset so that a
//! lexicographic listing is also offset order:
//!
//! ```text
//! logs/<log>/0/.partition
//! logs/<log>/0/00000000000000000000.json
//! logs/<log>/0/00000000000000000001.json
//! ```
//!
//! The partition exists once its `.partition` marker exists. Offsets are
//! claimed with create-only puts, so concurrent producers never overwrite each
//! other. Records are never deleted by this client, so the trim horizon is the
//! lowest offset still present.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use docsweep_core::LogRecord;
use futures::TryStreamExt;
use object_store::path::Path;
use object_store::{ObjectMeta, ObjectStore, PutMode};

use super::{Cursor, LogClient, PollBatch, DEFAULT_PARTITION};
use crate::error::{Error, Result};

/// Top-level prefix for all logs.
pub const LOG_ROOT: &str = "logs";

const PARTITION_MARKER: &str = ".partition";
const RECORD_SUFFIX: &str = ".json";
const DEFAULT_APPEND_ATTEMPTS: usize = 8;

/// Log backed by one object per record.
#[derive(Debug, Clone)]
pub struct ObjectStoreLog {
    store: Arc<dyn ObjectStore>,
    append_attempts: usize,
}

impl ObjectStoreLog {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            append_attempts: DEFAULT_APPEND_ATTEMPTS,
        }
    }

    /// Number of offset claims an append makes before giving up.
    pub fn with_append_attempts(mut self, attempts: usize) -> Self {
        self.append_attempts = attempts.max(1);
        self
    }

    fn partition_prefix(&self, log_name: &str) -> Result<Path> {
        if log_name.is_empty() || log_name.contains('/') {
            return Err(Error::InvalidKey {
                key: log_name.to_string(),
                reason: "log names must be a single non-empty path segment".to_string(),
            });
        }
        Path::parse(format!("{LOG_ROOT}/{log_name}/{DEFAULT_PARTITION}")).map_err(|e| {
            Error::InvalidKey {
                key: log_name.to_string(),
                reason: e.to_string(),
            }
        })
    }

    fn unavailable(log_name: &str) -> Error {
        Error::PartitionUnavailable {
            log: log_name.to_string(),
            partition: DEFAULT_PARTITION,
        }
    }

    async fn require_partition(&self, log_name: &str) -> Result<Path> {
        let prefix = self.partition_prefix(log_name)?;
        match self.store.head(&prefix.child(PARTITION_MARKER)).await {
            Ok(_) => Ok(prefix),
            Err(object_store::Error::NotFound { .. }) => Err(Self::unavailable(log_name)),
            Err(e) => Err(e.into()),
        }
    }

    /// Record objects under `prefix`, in offset order.
    async fn records(&self, prefix: &Path) -> Result<Vec<(u64, ObjectMeta)>> {
        let objects: Vec<ObjectMeta> = self.store.list(Some(prefix)).try_collect().await?;
        let mut records: Vec<(u64, ObjectMeta)> = objects
            .into_iter()
            .filter_map(|meta| {
                let offset = meta
                    .location
                    .filename()?
                    .strip_suffix(RECORD_SUFFIX)?
                    .parse::<u64>()
                    .ok()?;
                Some((offset, meta))
            })
            .collect();
        records.sort_by_key(|(offset, _)| *offset);
        Ok(records)
    }

    fn record_path(prefix: &Path, offset: u64) -> Path {
        prefix.child(format!("{offset:020}{RECORD_SUFFIX}"))
    }
}

#[async_trait]
impl LogClient for ObjectStoreLog {
    async fn open(&self, log_name: &str) -> Result<Cursor> {
        let prefix = self.require_partition(log_name).await?;
        let horizon = self
            .records(&prefix)
            .await?
            .first()
            .map(|(offset, _)| *offset)
            .unwrap_or(0);
        Ok(Cursor::new(log_name, DEFAULT_PARTITION, horizon))
    }

    async fn poll(&self, cursor: &Cursor, max_records: usize) -> Result<PollBatch> {
        let prefix = self.partition_prefix(cursor.log())?;
        let pending: Vec<(u64, ObjectMeta)> = self
            .records(&prefix)
            .await?
            .into_iter()
            .filter(|(offset, _)| *offset >= cursor.position())
            .take(max_records)
            .collect();

        let mut records = Vec::with_capacity(pending.len());
        for (offset, meta) in pending {
            let value = self.store.get(&meta.location).await?.bytes().await?;
            let timestamp = meta.last_modified.timestamp_millis().max(0) as u64;
            records.push(LogRecord::new(offset, timestamp, value));
        }

        let next_cursor = match records.last() {
            Some(last) => cursor.advanced_to(last.offset + 1),
            None => cursor.clone(),
        };
        Ok(PollBatch {
            records,
            next_cursor,
        })
    }

    async fn append(&self, log_name: &str, value: Bytes) -> Result<u64> {
        let prefix = self.require_partition(log_name).await?;

        for attempt in 1..=self.append_attempts {
            let offset = self
                .records(&prefix)
                .await?
                .last()
                .map(|(offset, _)| offset + 1)
                .unwrap_or(0);
            let path = Self::record_path(&prefix, offset);

            match self
                .store
                .put_opts(&path, value.clone(), PutMode::Create.into())
                .await
            {
                Ok(_) => return Ok(offset),
                Err(object_store::Error::AlreadyExists { .. }) => {
                    tracing::debug!(log = %log_name, offset, attempt, "Offset already claimed, retrying");
                }
                Err(object_store::Error::NotImplemented) => {
                    // No conditional puts: single-producer semantics.
                    self.store.put(&path, value).await?;
                    return Ok(offset);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::AppendConflict {
            log: log_name.to_string(),
            partition: DEFAULT_PARTITION,
            attempts: self.append_attempts,
        })
    }

    async fn create_log(&self, log_name: &str) -> Result<bool> {
        let marker = self.partition_prefix(log_name)?.child(PARTITION_MARKER);
        match self
            .store
            .put_opts(&marker, Bytes::new(), PutMode::Create.into())
            .await
        {
            Ok(_) => {
                tracing::info!(log = %log_name, "Log created");
                Ok(true)
            }
            Err(object_store::Error::AlreadyExists { .. }) => Ok(false),
            Err(object_store::Error::NotImplemented) => match self.store.head(&marker).await {
                Ok(_) => Ok(false),
                Err(object_store::Error::NotFound { .. }) => {
                    self.store.put(&marker, Bytes::new()).await?;
                    tracing::info!(log = %log_name, "Log created");
                    Ok(true)
                }
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        }
    }
}
