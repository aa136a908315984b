//! Error Types for docsweep core
//!
//! Errors raised while decoding log records and shaping documents for storage.
//!
//! ## Error Categories
//!
//! - `Json`: the payload is not a JSON document of the expected shape
//! - `InvalidId`: the document id cannot be used as an object key
//! - `InvalidTimestamp`: `publish_date` is not an ISO-8601 timestamp
//!
//! ## Usage
//! All functions in docsweep-core return `Result<T>` which is aliased to
//! `Result<T, Error>`, so callers can propagate with `?`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid document id: {0:?}")]
    InvalidId(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

pub type Result<T> = std::result::Result<T, Error>;
