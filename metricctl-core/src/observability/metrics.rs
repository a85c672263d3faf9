//! Client metrics definitions.
//!
//! All metrics follow Prometheus naming conventions:
//! - `_total` suffix for counters
//! - `_seconds` suffix for histograms measuring duration

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Register all metrics with descriptions.
pub fn register_metrics() {
    describe_counter!(
        "metricctl_rpc_requests_total",
        "Total number of backend calls (by method, status)"
    );
    describe_histogram!(
        "metricctl_rpc_duration_seconds",
        "Backend call duration, pagination included (by method)"
    );
    describe_counter!(
        "metricctl_validation_failures_total",
        "Requests rejected locally before dispatch (by operation)"
    );
}

/// Record one finished backend call.
pub fn record_rpc(method: &'static str, status: &str, elapsed: Duration) {
    counter!(
        "metricctl_rpc_requests_total",
        "method" => method,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("metricctl_rpc_duration_seconds", "method" => method).record(elapsed.as_secs_f64());
}

pub fn record_validation_failure(operation: &'static str) {
    counter!("metricctl_validation_failures_total", "operation" => operation).increment(1);
}
