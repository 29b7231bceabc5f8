//! Prometheus metrics for the resource service.
//!
//! - Connection metrics (active sessions, open streams)
//! - Stream event metrics (tweets, limit notices, errors)
//! - Operation metrics (outcome and latency per resource method)

mod helpers;

pub use helpers::{encode_metrics, OperationMetrics, StreamMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, HistogramVec,
    IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "twitter_resource";

lazy_static! {
    // ============================================================================
    // Connection Metrics
    // ============================================================================

    /// Number of connected accounts
    pub static ref CONNECTIONS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_connections_active", METRIC_PREFIX),
        "Number of connected Twitter accounts"
    ).unwrap();

    /// Number of open streams across all accounts
    pub static ref STREAMS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_streams_active", METRIC_PREFIX),
        "Number of open streaming subscriptions"
    ).unwrap();

    // ============================================================================
    // Stream Event Metrics
    // ============================================================================

    /// Stream events by kind (tweet, limit, error)
    pub static ref STREAM_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_stream_events_total", METRIC_PREFIX),
        "Total events received from streams",
        &["kind"]
    ).unwrap();

    // ============================================================================
    // Operation Metrics
    // ============================================================================

    /// Operations by name and outcome
    pub static ref OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_operations_total", METRIC_PREFIX),
        "Total resource operations",
        &["operation", "outcome"]
    ).unwrap();

    /// Operation latency, including waits on the service
    pub static ref OPERATION_LATENCY: HistogramVec = register_histogram_vec!(
        format!("{}_operation_latency_seconds", METRIC_PREFIX),
        "Resource operation latency in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]
    ).unwrap();
}
