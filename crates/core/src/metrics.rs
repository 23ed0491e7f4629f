//! Prometheus metrics for the provisioning core.
//!
//! This module provides metrics for:
//! - Provider fetch cycles (result, duration)
//! - Chart API client requests (operation, status, duration)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

/// Fetch cycles completed, by result.
pub static PROVISION_CYCLES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "plotline_provision_cycles_total",
            "Total completed fetch cycles",
        ),
        &["result"], // "loaded", "error"
    )
    .unwrap()
});

/// Fetch cycle duration in seconds.
pub static PROVISION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "plotline_provision_duration_seconds",
            "Duration of fetch cycles",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["result"],
    )
    .unwrap()
});

/// Chart API requests total.
pub static CLIENT_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("plotline_client_requests_total", "Total chart API requests"),
        &["operation", "status"], // operation: "form_data", "datasource", "query_data"
    )
    .unwrap()
});

/// Chart API request duration in seconds.
pub static CLIENT_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "plotline_client_request_duration_seconds",
            "Duration of chart API requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation"],
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(PROVISION_CYCLES.clone()),
        Box::new(PROVISION_DURATION.clone()),
        Box::new(CLIENT_REQUESTS.clone()),
        Box::new(CLIENT_REQUEST_DURATION.clone()),
    ]
}
