//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{OPERATIONS_TOTAL, OPERATION_LATENCY, STREAM_EVENTS_TOTAL};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording stream event metrics
pub struct StreamMetrics;

impl StreamMetrics {
    pub fn record_tweet() {
        STREAM_EVENTS_TOTAL.with_label_values(&["tweet"]).inc();
    }

    pub fn record_limit() {
        STREAM_EVENTS_TOTAL.with_label_values(&["limit"]).inc();
    }

    pub fn record_error() {
        STREAM_EVENTS_TOTAL.with_label_values(&["error"]).inc();
    }
}

/// Helper struct for recording operation outcomes
pub struct OperationMetrics;

impl OperationMetrics {
    pub fn record(operation: &str, success: bool, elapsed: Duration) {
        let outcome = if success { "ok" } else { "error" };
        OPERATIONS_TOTAL
            .with_label_values(&[operation, outcome])
            .inc();
        OPERATION_LATENCY
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }
}
