//! docsweep Storage
//!
//! Storage collaborators for the consumer and the sweep pipeline:
//!
//! - **Buckets**: [`Bucket`] is a flat key/value namespace on top of any
//!   `object_store::ObjectStore`, used for both the staging and destination
//!   buckets.
//! - **Logs**: [`LogClient`] is the append-only, partitioned log the consumer
//!   reads from. [`MemoryLog`] keeps partitions in memory; [`ObjectStoreLog`]
//!   persists one object per record.
//! - **Config**: [`StoreConfig`] selects the backend (memory, local
//!   filesystem, S3) and builds the shared root store.
//!
//! ## Layout
//!
//! ```text
//! <root>/
//!   temp/.bucket            staging bucket marker
//!   temp/<id>.json          staged documents
//!   my-bucket/<id>.json     published documents
//!   logs/<log>/0/.partition partition marker
//!   logs/<log>/0/<offset>.json
//! ```

pub mod bucket;
pub mod config;
pub mod error;
pub mod log;

pub use bucket::{Bucket, BUCKET_MARKER};
pub use config::{StoreBackend, StoreConfig, Stores};
pub use error::{Error, Result};
pub use log::{Cursor, LogClient, MemoryLog, ObjectStoreLog, PollBatch};
