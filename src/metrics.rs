// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the nodedns operator.
//!
//! All metrics carry the `nodedns_` prefix and live in [`METRICS_REGISTRY`].
//!
//! # Example
//!
//! ```rust,no_run
//! use nodedns::metrics::{gather_metrics, record_reconciliation_success};
//!
//! record_reconciliation_success("DaemonSet", std::time::Duration::from_millis(12));
//! println!("{}", gather_metrics().unwrap());
//! ```

use crate::constants::{METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PATH};
use axum::{http::StatusCode, routing::get, Router};
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::info;

/// Namespace prefix for all metrics
const METRICS_NAMESPACE: &str = "nodedns";

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by resource type and status
///
/// Labels:
/// - `resource_type`: Kind of resource
/// - `status`: Outcome (`success`, `error`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliations by resource type and status",
    );
    let counter = CounterVec::new(opts, &["resource_type", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by resource type",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]);
    let histogram = HistogramVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Drift Metrics
// ============================================================================

/// Total number of managed fields found drifted and corrected
///
/// Labels:
/// - `path`: Managed field path (e.g. `image`, `spec.template.spec.nodeSelector`)
pub static DRIFT_CORRECTIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_drift_corrections_total"),
        "Total number of drifted managed fields by field path",
    );
    let counter = CounterVec::new(opts, &["path"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Resource Lifecycle Metrics
// ============================================================================

/// Total number of resource writes
///
/// Labels:
/// - `resource_type`: Kind of resource
/// - `operation`: `create`, `update` or `recreate`
pub static RESOURCE_WRITES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resource_writes_total"),
        "Total number of resource writes by type and operation",
    );
    let counter = CounterVec::new(opts, &["resource_type", "operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of errors by resource type and error category
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by resource type and error category",
    );
    let counter = CounterVec::new(opts, &["resource_type", "error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Record a successful reconciliation
pub fn record_reconciliation_success(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "success"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a failed reconciliation
pub fn record_reconciliation_error(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "error"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record one drifted managed field
pub fn record_drift(path: &str) {
    DRIFT_CORRECTIONS_TOTAL.with_label_values(&[path]).inc();
}

/// Record a create, update or recreate of a resource
pub fn record_resource_write(resource_type: &str, operation: &str) {
    RESOURCE_WRITES_TOTAL
        .with_label_values(&[resource_type, operation])
        .inc();
}

/// Record an error
///
/// # Arguments
/// * `resource_type` - The kind of resource where error occurred
/// * `error_type` - Category of error (e.g., `api_error`, `InvalidInput`)
pub fn record_error(resource_type: &str, error_type: &str) {
    ERRORS_TOTAL
        .with_label_values(&[resource_type, error_type])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

async fn metrics_handler() -> Result<String, (StatusCode, String)> {
    gather_metrics().map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// Router exposing [`gather_metrics`] on the metrics path
pub fn metrics_router() -> Router {
    Router::new().route(METRICS_SERVER_PATH, get(metrics_handler))
}

/// Serve the metrics endpoint until the listener fails
///
/// # Errors
/// Returns an error if binding the port or serving fails
pub async fn serve_metrics(port: u16) -> anyhow::Result<()> {
    let addr = format!("{METRICS_SERVER_BIND_ADDRESS}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, path = METRICS_SERVER_PATH, "Serving Prometheus metrics");
    axum::serve(listener, metrics_router()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_reconciliation_success() {
        let resource_type = "TestResource";
        let duration = Duration::from_millis(500);

        record_reconciliation_success(resource_type, duration);

        let counter = RECONCILIATION_TOTAL.with_label_values(&[resource_type, "success"]);
        assert!(counter.get() > 0.0);

        let histogram = RECONCILIATION_DURATION_SECONDS.with_label_values(&[resource_type]);
        assert!(histogram.get_sample_count() > 0);
    }

    #[test]
    fn test_record_reconciliation_error() {
        let resource_type = "TestResourceError";

        record_reconciliation_error(resource_type, Duration::from_millis(250));

        let counter = RECONCILIATION_TOTAL.with_label_values(&[resource_type, "error"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn test_record_drift() {
        record_drift("test-path");
        record_drift("test-path");

        let counter = DRIFT_CORRECTIONS_TOTAL.with_label_values(&["test-path"]);
        assert!(counter.get() >= 2.0);
    }

    #[test]
    fn test_gather_metrics() {
        record_reconciliation_success("GatherTest", Duration::from_millis(100));
        record_resource_write("GatherTest", "update");

        let metrics_text = gather_metrics().unwrap();
        assert!(
            metrics_text.contains("nodedns_reconciliations_total"),
            "Metrics should contain reconciliation counter"
        );
        assert!(
            metrics_text.contains("nodedns_resource_writes_total"),
            "Metrics should contain write counter"
        );
    }
}
