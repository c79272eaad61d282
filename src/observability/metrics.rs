//! # Metrics
//!
//! Prometheus metrics for monitoring the operator.
//!
//! ## Metrics Exposed
//!
//! - `rdb_operator_reconciliations_total` - Total number of reconciliation passes
//! - `rdb_operator_reconciliation_errors_total` - Total number of reconciliation errors
//! - `rdb_operator_reconcile_duration_seconds` - Duration of reconciliation passes

use std::sync::LazyLock;

use prometheus::{Histogram, IntCounter, Registry};

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "rdb_operator_reconciliations_total",
        "Total number of reconciliation passes",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "rdb_operator_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILE_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "rdb_operator_reconcile_duration_seconds",
            "Duration of reconciliation passes in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILE_DURATION metric - this should never happen")
});

/// Register all metrics with the registry; call once at startup
pub fn register() {
    REGISTRY
        .register(Box::new(RECONCILIATIONS_TOTAL.clone()))
        .expect("Failed to register RECONCILIATIONS_TOTAL");
    REGISTRY
        .register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))
        .expect("Failed to register RECONCILIATION_ERRORS_TOTAL");
    REGISTRY
        .register(Box::new(RECONCILE_DURATION.clone()))
        .expect("Failed to register RECONCILE_DURATION");
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconcile_duration(seconds: f64) {
    RECONCILE_DURATION.observe(seconds);
}
