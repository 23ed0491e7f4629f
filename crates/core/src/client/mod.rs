//! Chart API client abstraction.
//!
//! This module provides a `ChartClient` trait for the three fetches a chart
//! render needs (form data resolution, datasource metadata, query data) and
//! an HTTP implementation talking to the dashboard server.

mod http;
mod types;

pub use http::HttpChartClient;
pub use types::*;
