//! Mock chart client for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::client::{
    ChartClient, ChartFormData, ChartId, ChartInput, ClientError, DatasourceMeta, QueryData,
    RequestOptions,
};

/// A recorded client call for test assertions.
#[derive(Debug, Clone)]
pub enum RecordedCall {
    ResolveFormData {
        chart_id: Option<ChartId>,
        inline: Option<ChartFormData>,
        options: RequestOptions,
    },
    FetchDatasource {
        datasource: String,
        options: RequestOptions,
    },
    FetchQueryData {
        datasource: String,
        options: RequestOptions,
    },
}

/// Mock implementation of the ChartClient trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable results per operation
/// - Track every call (with its options) for assertions
/// - Simulate failures and slow responses
///
/// # Example
///
/// ```rust,ignore
/// use plotline_core::testing::{fixtures, MockChartClient};
///
/// let client = MockChartClient::new();
/// client.set_form_data(fixtures::form_data("ds1")).await;
/// client.set_query_data(fixtures::query_rows(3)).await;
///
/// // ... run the provider against the mock ...
///
/// assert_eq!(client.query_data_count().await, 1);
/// assert_eq!(client.datasource_count().await, 0);
/// ```
pub struct MockChartClient {
    /// Result returned by `resolve_form_data` (falls back to the inline
    /// form data of the input when unset).
    form_data: Arc<RwLock<Option<ChartFormData>>>,
    /// Result returned by `fetch_datasource` (defaults to metadata keyed by
    /// the requested identifier when unset).
    datasource: Arc<RwLock<Option<DatasourceMeta>>>,
    /// Result returned by `fetch_query_data` (defaults to empty rows).
    query_data: Arc<RwLock<Option<QueryData>>>,
    /// If set, the next `resolve_form_data` call fails with this error.
    resolve_error: Arc<RwLock<Option<ClientError>>>,
    /// If set, the next `fetch_datasource` call fails with this error.
    datasource_error: Arc<RwLock<Option<ClientError>>>,
    /// If set, the next `fetch_query_data` call fails with this error.
    query_error: Arc<RwLock<Option<ClientError>>>,
    /// Simulated latency applied to every call.
    call_delay: Arc<RwLock<Option<Duration>>>,
    /// Recorded calls in invocation order.
    calls: Arc<RwLock<Vec<RecordedCall>>>,
}

impl Default for MockChartClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChartClient {
    /// Create a new mock client with default results and no errors.
    pub fn new() -> Self {
        Self {
            form_data: Arc::new(RwLock::new(None)),
            datasource: Arc::new(RwLock::new(None)),
            query_data: Arc::new(RwLock::new(None)),
            resolve_error: Arc::new(RwLock::new(None)),
            datasource_error: Arc::new(RwLock::new(None)),
            query_error: Arc::new(RwLock::new(None)),
            call_delay: Arc::new(RwLock::new(None)),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Set the form data returned by `resolve_form_data`.
    pub async fn set_form_data(&self, form_data: ChartFormData) {
        *self.form_data.write().await = Some(form_data);
    }

    /// Set the metadata returned by `fetch_datasource`.
    pub async fn set_datasource(&self, datasource: DatasourceMeta) {
        *self.datasource.write().await = Some(datasource);
    }

    /// Set the result returned by `fetch_query_data`.
    pub async fn set_query_data(&self, query_data: QueryData) {
        *self.query_data.write().await = Some(query_data);
    }

    /// Configure the next `resolve_form_data` call to fail.
    pub async fn set_resolve_error(&self, error: ClientError) {
        *self.resolve_error.write().await = Some(error);
    }

    /// Configure the next `fetch_datasource` call to fail.
    pub async fn set_datasource_error(&self, error: ClientError) {
        *self.datasource_error.write().await = Some(error);
    }

    /// Configure the next `fetch_query_data` call to fail.
    pub async fn set_query_error(&self, error: ClientError) {
        *self.query_error.write().await = Some(error);
    }

    /// Apply a simulated latency to every subsequent call.
    pub async fn set_call_delay(&self, delay: Duration) {
        *self.call_delay.write().await = Some(delay);
    }

    /// Remove the simulated latency.
    pub async fn clear_call_delay(&self) {
        *self.call_delay.write().await = None;
    }

    /// Get recorded calls in invocation order.
    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Clear recorded calls.
    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
    }

    /// Total number of calls across all operations.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Number of `resolve_form_data` calls.
    pub async fn resolve_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, RecordedCall::ResolveFormData { .. }))
            .count()
    }

    /// Number of `fetch_datasource` calls.
    pub async fn datasource_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, RecordedCall::FetchDatasource { .. }))
            .count()
    }

    /// Number of `fetch_query_data` calls.
    pub async fn query_data_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, RecordedCall::FetchQueryData { .. }))
            .count()
    }

    async fn simulate_latency(&self) {
        let delay = *self.call_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ChartClient for MockChartClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn resolve_form_data(
        &self,
        input: &ChartInput,
        options: &RequestOptions,
    ) -> Result<ChartFormData, ClientError> {
        self.simulate_latency().await;

        self.calls.write().await.push(RecordedCall::ResolveFormData {
            chart_id: input.chart_id().map(|id| id.as_ref().clone()),
            inline: input.form_data().map(|fd| fd.as_ref().clone()),
            options: options.clone(),
        });

        if let Some(error) = self.resolve_error.write().await.take() {
            return Err(error);
        }

        if let Some(ref form_data) = *self.form_data.read().await {
            return Ok(form_data.clone());
        }

        input
            .form_data()
            .map(|fd| fd.as_ref().clone())
            .ok_or_else(|| {
                ClientError::Internal("no form data configured on mock".to_string())
            })
    }

    async fn fetch_datasource(
        &self,
        datasource: &str,
        options: &RequestOptions,
    ) -> Result<DatasourceMeta, ClientError> {
        self.simulate_latency().await;

        self.calls.write().await.push(RecordedCall::FetchDatasource {
            datasource: datasource.to_string(),
            options: options.clone(),
        });

        if let Some(error) = self.datasource_error.write().await.take() {
            return Err(error);
        }

        let configured = self.datasource.read().await.clone();
        Ok(configured.unwrap_or_else(|| DatasourceMeta::new(datasource)))
    }

    async fn fetch_query_data(
        &self,
        form_data: &ChartFormData,
        options: &RequestOptions,
    ) -> Result<QueryData, ClientError> {
        self.simulate_latency().await;

        self.calls.write().await.push(RecordedCall::FetchQueryData {
            datasource: form_data.datasource.clone(),
            options: options.clone(),
        });

        if let Some(error) = self.query_error.write().await.take() {
            return Err(error);
        }

        let configured = self.query_data.read().await.clone();
        Ok(configured.unwrap_or_else(|| QueryData::new(serde_json::json!({ "rows": [] }))))
    }
}
