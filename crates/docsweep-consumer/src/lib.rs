//! docsweep Log Consumer
//!
//! Reads documents from one log partition, stages each in the staging bucket
//! and triggers a sweep for it, waiting for the sweep before reading on.
//!
//! ```text
//! INIT ──→ POLLING ──(records)──→ STAGING ──→ TRIGGERING ──┐
//!            ↑  │                                          │
//!            │  └──(empty: sleep poll_backoff)──┐          │
//!            └──────────────────────────────────┴──────────┘
//!
//! any uncaught error ──→ TERMINATED
//! ```
//!
//! A record that cannot be staged is logged and skipped. A record that is not
//! a document ends the consumer, as does a poll error unless an opt-in
//! [`PollRetryPolicy`] retries it.

pub mod config;
pub mod consumer;
pub mod error;

pub use config::{ConsumerConfig, PollRetryPolicy, RetryPolicy};
pub use consumer::{ConsumerState, ConsumerStats, LogConsumer};
pub use error::{ConsumerError, Result};
