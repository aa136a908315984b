use lazy_static::lazy_static;
use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry};
use std::sync::Once;

static INIT: Once = Once::new();

lazy_static! {
    /// Global Prometheus metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Consumer Metrics
    // ============================================================================

    /// Log polls issued
    pub static ref CONSUMER_POLLS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("docsweep_consumer_polls_total", "Total log polls"),
        &["log"]
    ).expect("metric can be created");

    /// Polls that returned no records
    pub static ref CONSUMER_EMPTY_POLLS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("docsweep_consumer_empty_polls_total", "Total log polls that returned no records"),
        &["log"]
    ).expect("metric can be created");

    /// Records read from the log
    pub static ref CONSUMER_RECORDS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("docsweep_consumer_records_total", "Total records read from the log"),
        &["log"]
    ).expect("metric can be created");

    /// Records that could not be staged
    pub static ref STAGING_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("docsweep_staging_failures_total", "Total records skipped by the consumer"),
        &["log", "reason"]
    ).expect("metric can be created");

    // ============================================================================
    // Sweep Metrics
    // ============================================================================

    /// Completed sweeps
    pub static ref SWEEPS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("docsweep_sweeps_total", "Total completed sweeps"),
        &["staging_bucket"]
    ).expect("metric can be created");

    /// Documents moved from staging into a sweep batch
    pub static ref SWEEP_COLLECTED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("docsweep_sweep_collected_total", "Total documents collected from staging"),
        &["staging_bucket"]
    ).expect("metric can be created");

    /// Staged objects dropped because they could not be read or parsed
    pub static ref SWEEP_DROPPED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("docsweep_sweep_dropped_total", "Total staged objects dropped during collect"),
        &["staging_bucket"]
    ).expect("metric can be created");

    /// Documents written to the destination bucket
    pub static ref SWEEP_PUBLISHED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("docsweep_sweep_published_total", "Total documents published"),
        &["destination_bucket"]
    ).expect("metric can be created");

    /// Wall time of one sweep
    pub static ref SWEEP_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new("docsweep_sweep_duration_seconds", "Sweep duration in seconds")
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0])
    ).expect("metric can be created");
}

/// Initialize metrics registry
/// Can be called multiple times safely (idempotent)
pub fn init() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(CONSUMER_POLLS_TOTAL.clone()))
            .expect("consumer_polls_total can be registered");
        REGISTRY
            .register(Box::new(CONSUMER_EMPTY_POLLS_TOTAL.clone()))
            .expect("consumer_empty_polls_total can be registered");
        REGISTRY
            .register(Box::new(CONSUMER_RECORDS_TOTAL.clone()))
            .expect("consumer_records_total can be registered");
        REGISTRY
            .register(Box::new(STAGING_FAILURES_TOTAL.clone()))
            .expect("staging_failures_total can be registered");

        REGISTRY
            .register(Box::new(SWEEPS_TOTAL.clone()))
            .expect("sweeps_total can be registered");
        REGISTRY
            .register(Box::new(SWEEP_COLLECTED_TOTAL.clone()))
            .expect("sweep_collected_total can be registered");
        REGISTRY
            .register(Box::new(SWEEP_DROPPED_TOTAL.clone()))
            .expect("sweep_dropped_total can be registered");
        REGISTRY
            .register(Box::new(SWEEP_PUBLISHED_TOTAL.clone()))
            .expect("sweep_published_total can be registered");
        REGISTRY
            .register(Box::new(SWEEP_DURATION.clone()))
            .expect("sweep_duration can be registered");
    });
}
