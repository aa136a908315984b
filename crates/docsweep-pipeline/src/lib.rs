//! docsweep Sweep Pipeline
//!
//! Moves documents from the staging bucket to the destination bucket in three
//! stages:
//!
//! ```text
//! staging bucket ──Collect──→ batch ──Transform──→ batch ──Publish──→ destination bucket
//!   (drained)                (word_count set)                 (<id>.json, overwrite)
//! ```
//!
//! Each run sweeps everything currently staged, not only the document whose
//! arrival triggered it, so documents orphaned by a crash are picked up by the
//! next run. Documents are published in the order the staging store lists
//! them, which is not necessarily log order.
//!
//! The consumer starts sweeps through a [`SweepTrigger`] and waits for each to
//! finish: [`InProcessTrigger`] runs the pipeline on the caller's task,
//! [`CommandTrigger`] runs `docsweep sweep` as a child process.

pub mod error;
pub mod sweep;
pub mod trigger;

pub use error::{PipelineError, Result};
pub use sweep::{transform, Collected, SweepPipeline, SweepReport, SweepStage};
pub use trigger::{CommandTrigger, InProcessTrigger, SweepOutcome, SweepTrigger};
