//! Log Record Data Structure
//!
//! A `LogRecord` is one raw entry read from a log partition, before it is
//! decoded into a [`Document`].
//!
//! ## Structure
//! - **offset**: position within the partition; strictly increasing
//! - **timestamp**: append time in milliseconds since epoch
//! - **value**: the payload, expected to be a JSON document
//!
//! Uses `bytes::Bytes` so records can be handed around without copying the
//! payload.

use bytes::Bytes;

use crate::document::Document;
use crate::error::Result;

/// A single record in a log partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Offset of this record in the partition
    pub offset: u64,

    /// Timestamp in milliseconds since epoch
    pub timestamp: u64,

    /// Value (payload)
    pub value: Bytes,
}

impl LogRecord {
    pub fn new(offset: u64, timestamp: u64, value: Bytes) -> Self {
        Self {
            offset,
            timestamp,
            value,
        }
    }

    /// Decode the payload as a document.
    pub fn decode(&self) -> Result<Document> {
        Document::from_slice(&self.value)
    }
}
