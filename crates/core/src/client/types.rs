//! Types for the chart API client boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use thiserror::Error;

/// Identifier of a chart stored on the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartId(String);

impl ChartId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ChartId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChartId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Resolved chart configuration.
///
/// The `datasource` identifier is the only field this crate interprets; the
/// rest of the configuration is owned by the server and carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartFormData {
    /// Identifier of the datasource this chart queries.
    pub datasource: String,
    /// Server-owned configuration fields, passed through untouched.
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl ChartFormData {
    pub fn new(datasource: impl Into<String>) -> Self {
        Self {
            datasource: datasource.into(),
            fields: serde_json::Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }
}

/// Datasource metadata, keyed by the identifier found on [`ChartFormData`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasourceMeta {
    /// Datasource identifier.
    pub id: String,
    /// Server-owned metadata fields (columns, verbose names, ...).
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl DatasourceMeta {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: serde_json::Map::new(),
        }
    }
}

/// Computed query result for a chart. Shape is owned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryData(pub serde_json::Value);

impl QueryData {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Request-shaping options for a single fetch, passed through to the client
/// unmodified. Each of the three fetches in a cycle gets its own instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Per-request timeout override in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Extra headers to send with the request.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// Extra query parameters to append to the request URL.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub query_params: HashMap<String, String>,
}

impl RequestOptions {
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }
}

/// Identity of the chart to provision.
///
/// At least one of the inline form data or the stored chart id must be
/// present; the constructor enforces this. Both slots are held behind `Arc`
/// so that change detection can compare by pointer identity rather than by
/// value (see [`ChartInput::same_identity`]).
#[derive(Debug, Clone)]
pub struct ChartInput {
    form_data: Option<Arc<ChartFormData>>,
    chart_id: Option<Arc<ChartId>>,
}

impl ChartInput {
    /// Build an input from any combination of inline form data and stored id.
    pub fn new(
        form_data: Option<Arc<ChartFormData>>,
        chart_id: Option<Arc<ChartId>>,
    ) -> Result<Self, ClientError> {
        if form_data.is_none() && chart_id.is_none() {
            return Err(ClientError::InvalidRequest(
                "chart input must include inline form data or a chart id".to_string(),
            ));
        }
        Ok(Self {
            form_data,
            chart_id,
        })
    }

    pub fn from_form_data(form_data: Arc<ChartFormData>) -> Self {
        Self {
            form_data: Some(form_data),
            chart_id: None,
        }
    }

    pub fn from_chart_id(chart_id: Arc<ChartId>) -> Self {
        Self {
            form_data: None,
            chart_id: Some(chart_id),
        }
    }

    pub fn form_data(&self) -> Option<&Arc<ChartFormData>> {
        self.form_data.as_ref()
    }

    pub fn chart_id(&self) -> Option<&Arc<ChartId>> {
        self.chart_id.as_ref()
    }

    /// Whether both inputs point at the same underlying values.
    ///
    /// Comparison is by pointer identity, not by value: two separately
    /// allocated but equal form data objects are different identities. This
    /// keeps the change check cheap regardless of form data size.
    pub fn same_identity(&self, other: &Self) -> bool {
        same_slot(&self.form_data, &other.form_data) && same_slot(&self.chart_id, &other.chart_id)
    }
}

fn same_slot<T>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Errors that can occur on the chart API boundary.
#[derive(Debug, Clone, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientError {
    #[error("Chart API connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Chart API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Trait for chart API backends.
///
/// One implementation talks to the real HTTP API; tests use
/// `testing::MockChartClient`. All three operations take the per-fetch
/// [`RequestOptions`] supplied by the consumer and pass them through.
#[async_trait]
pub trait ChartClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Resolve the full form data for the given input.
    ///
    /// The input may carry a stored chart id, inline form data, or both.
    /// When both are present the backend decides precedence; callers must
    /// not assume which side wins.
    async fn resolve_form_data(
        &self,
        input: &ChartInput,
        options: &RequestOptions,
    ) -> Result<ChartFormData, ClientError>;

    /// Fetch metadata for the datasource referenced by a chart.
    async fn fetch_datasource(
        &self,
        datasource: &str,
        options: &RequestOptions,
    ) -> Result<DatasourceMeta, ClientError>;

    /// Execute the chart's query and return its result data.
    async fn fetch_query_data(
        &self,
        form_data: &ChartFormData,
        options: &RequestOptions,
    ) -> Result<QueryData, ClientError>;
}
