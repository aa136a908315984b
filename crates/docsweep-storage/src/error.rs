//! Storage Error Types
//!
//! ## Error Categories
//!
//! ### Log Errors
//! - `PartitionUnavailable`: the log or its partition does not exist
//! - `AppendConflict`: another writer kept claiming the next offset
//!
//! ### Object Errors
//! - `ObjectStore`: low-level object store operation failed
//! - `InvalidKey` / `InvalidBucket`: a name cannot be mapped to a path
//! - `Document`: a stored payload is not a document
//!
//! ### Connectivity
//! - `Connection`: the backend could not be reached
//!
//! ## Transient vs fatal
//!
//! [`Error::is_transient`] tells an opt-in retry policy which failures are
//! worth another attempt. Everything else is treated as unrecoverable.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Partition unavailable: {log}/{partition}")]
    PartitionUnavailable { log: String, partition: u32 },

    #[error("Append conflict on {log}/{partition} after {attempts} attempts")]
    AppendConflict {
        log: String,
        partition: u32,
        attempts: usize,
    },

    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Invalid bucket name: {0:?}")]
    InvalidBucket(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Document error: {0}")]
    Document(#[from] docsweep_core::Error),
}

impl Error {
    /// Whether retrying the same operation could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Connection(_) | Error::AppendConflict { .. } => true,
            Error::ObjectStore(e) => matches!(
                e,
                object_store::Error::Generic { .. } | object_store::Error::Precondition { .. }
            ),
            Error::PartitionUnavailable { .. }
            | Error::InvalidKey { .. }
            | Error::InvalidBucket(_)
            | Error::Config(_)
            | Error::Document(_) => false,
        }
    }

    /// Whether the error reports a missing object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ObjectStore(object_store::Error::NotFound { .. }))
    }
}
