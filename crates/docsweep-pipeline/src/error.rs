//! Error types for the sweep pipeline.
//!
//! Only the Publish stage can fail a sweep. Collect recovers from every
//! per-object failure by itself, and Transform does no I/O.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The destination bucket could not be created or checked.
    #[error("Failed to ensure destination bucket '{bucket}': {source}")]
    EnsureBucket {
        bucket: String,
        #[source]
        source: docsweep_storage::Error,
    },

    /// Writing one document to the destination failed. Ends the sweep.
    #[error("Failed to publish document '{id}': {source}")]
    PublishWrite {
        id: String,
        #[source]
        source: docsweep_storage::Error,
    },

    /// The sweep runner could not be started.
    #[error("Failed to launch sweep command '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}
