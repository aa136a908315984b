//! Consumer Error Types
//!
//! Every variant is fatal: the consumer moves to `Terminated` and the error
//! is returned to the caller. Recoverable per-record failures never surface
//! here.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConsumerError>;

#[derive(Debug, Error)]
pub enum ConsumerError {
    /// The log or its partition does not exist. Raised before the first poll.
    #[error("Log '{log}' has no readable partition: {source}")]
    PartitionUnavailable {
        log: String,
        #[source]
        source: docsweep_storage::Error,
    },

    /// Polling failed and the retry policy did not recover it.
    #[error("Unrecoverable poll error at {cursor}: {source}")]
    UnrecoverablePoll {
        cursor: String,
        #[source]
        source: docsweep_storage::Error,
    },

    /// A log record is not a document.
    #[error("Record at offset {offset} is not a document: {source}")]
    Decode {
        offset: u64,
        #[source]
        source: docsweep_core::Error,
    },

    /// A sweep could not be started.
    #[error("Sweep trigger failed: {0}")]
    Trigger(#[from] docsweep_pipeline::PipelineError),

    /// The log returned a cursor behind the one it was polled with.
    #[error("Cursor moved backwards from {previous} to {next}")]
    CursorRegression { previous: String, next: String },

    /// Startup I/O other than opening the log failed.
    #[error("Storage error: {0}")]
    Storage(#[from] docsweep_storage::Error),
}
