//! Testing utilities and mock implementations.
//!
//! This module provides a mock implementation of the [`ChartClient`] trait,
//! allowing provider tests to run without a real dashboard server.
//!
//! # Example
//!
//! ```rust,ignore
//! use plotline_core::testing::{fixtures, MockChartClient};
//!
//! let client = MockChartClient::new();
//! client.set_form_data(fixtures::form_data("ds1")).await;
//! client.set_query_data(fixtures::query_rows(10)).await;
//!
//! // Use as Arc<dyn ChartClient> in a ChartDataProvider...
//! ```
//!
//! [`ChartClient`]: crate::client::ChartClient

mod mock_client;

pub use mock_client::{MockChartClient, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::json;

    use crate::client::{ChartFormData, DatasourceMeta, QueryData};

    /// Create a test form data object with reasonable defaults.
    pub fn form_data(datasource: &str) -> ChartFormData {
        ChartFormData::new(datasource)
            .with_field("viz_type", json!("line"))
            .with_field("row_limit", json!(1000))
    }

    /// Create test datasource metadata with a couple of columns.
    pub fn datasource_meta(id: &str) -> DatasourceMeta {
        let mut meta = DatasourceMeta::new(id);
        meta.fields.insert(
            "columns".to_string(),
            json!([
                {"name": "ts", "type": "TIMESTAMP"},
                {"name": "value", "type": "DOUBLE"}
            ]),
        );
        meta
    }

    /// Create a query result with `n` rows.
    pub fn query_rows(n: usize) -> QueryData {
        let rows: Vec<_> = (0..n).map(|i| json!({"ts": i, "value": i as f64 * 1.5})).collect();
        QueryData::new(json!({ "rows": rows }))
    }
}
