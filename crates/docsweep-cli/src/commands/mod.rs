//! Command handlers for docsweep
//!
//! - listen: log consumer
//! - sweep: one sweep run
//! - produce: log producer for local development
//! - status: staged and published counts

pub mod listen;
pub mod produce;
pub mod status;
pub mod sweep;
