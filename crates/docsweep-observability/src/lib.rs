//! docsweep Observability
//!
//! Prometheus metrics for the consumer loop and the sweep pipeline.
//!
//! # Usage
//!
//! ```no_run
//! use docsweep_observability::{exporter, metrics};
//!
//! metrics::init();
//! let router = exporter::create_metrics_router();
//! ```

pub mod exporter;
pub mod metrics;

pub use metrics::{init, REGISTRY};
