//! HTTP chart API backend implementation.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::ApiConfig;
use crate::metrics;

use super::{
    ChartClient, ChartFormData, ChartId, ChartInput, ClientError, DatasourceMeta, QueryData,
    RequestOptions,
};

/// Chart API backend talking to the dashboard server over HTTP.
pub struct HttpChartClient {
    client: Client,
    config: ApiConfig,
}

impl HttpChartClient {
    /// Create a new HttpChartClient with the given configuration.
    pub fn new(config: ApiConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Build the URL for fetching a stored chart's form data.
    fn form_data_url(&self, chart_id: &ChartId, options: &RequestOptions) -> String {
        let url = format!(
            "{}/api/v1/chart/{}/form_data",
            self.base(),
            urlencoding::encode(chart_id.as_str())
        );
        append_query_params(url, &options.query_params)
    }

    /// Build the URL for fetching datasource metadata.
    fn datasource_url(&self, datasource: &str, options: &RequestOptions) -> String {
        let url = format!(
            "{}/api/v1/datasource/{}",
            self.base(),
            urlencoding::encode(datasource)
        );
        append_query_params(url, &options.query_params)
    }

    /// Build the URL for the query data endpoint.
    fn query_data_url(&self, options: &RequestOptions) -> String {
        let url = format!("{}/api/v1/chart/data", self.base());
        append_query_params(url, &options.query_params)
    }

    /// Apply the API key and per-request options to a request.
    fn apply_options(&self, mut request: RequestBuilder, options: &RequestOptions) -> RequestBuilder {
        if let Some(ref api_key) = self.config.api_key {
            request = request.header("X-Api-Key", api_key);
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(timeout_secs) = options.timeout_secs {
            request = request.timeout(Duration::from_secs(timeout_secs));
        }
        request
    }

    /// Send a request and parse the JSON response, mapping transport and
    /// status errors onto [`ClientError`].
    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let start = Instant::now();
        let result = self.send_json_inner(request).await;

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::CLIENT_REQUESTS
            .with_label_values(&[operation, status])
            .inc();
        metrics::CLIENT_REQUEST_DURATION
            .with_label_values(&[operation])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    async fn send_json_inner<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await.map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ApiError(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl ChartClient for HttpChartClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn resolve_form_data(
        &self,
        input: &ChartInput,
        options: &RequestOptions,
    ) -> Result<ChartFormData, ClientError> {
        let Some(chart_id) = input.chart_id() else {
            // Nothing stored to resolve; the inline form data is already
            // complete.
            return input
                .form_data()
                .map(|form_data| form_data.as_ref().clone())
                .ok_or_else(|| {
                    ClientError::InvalidRequest(
                        "chart input carries neither form data nor a chart id".to_string(),
                    )
                });
        };

        let url = self.form_data_url(chart_id, options);
        debug!(chart_id = %chart_id, "Fetching stored form data");

        let stored: ChartFormData = self
            .send_json("form_data", self.apply_options(self.client.get(&url), options))
            .await?;

        // Stored values are the base; inline keys overlay them.
        Ok(match input.form_data() {
            Some(inline) => overlay(inline, stored),
            None => stored,
        })
    }

    async fn fetch_datasource(
        &self,
        datasource: &str,
        options: &RequestOptions,
    ) -> Result<DatasourceMeta, ClientError> {
        let url = self.datasource_url(datasource, options);
        debug!(datasource = datasource, "Fetching datasource metadata");

        self.send_json("datasource", self.apply_options(self.client.get(&url), options))
            .await
    }

    async fn fetch_query_data(
        &self,
        form_data: &ChartFormData,
        options: &RequestOptions,
    ) -> Result<QueryData, ClientError> {
        let url = self.query_data_url(options);
        debug!(datasource = %form_data.datasource, "Fetching query data");

        self.send_json(
            "query_data",
            self.apply_options(self.client.post(&url).json(form_data), options),
        )
        .await
    }
}

/// Overlay inline form data over a stored base; inline keys win.
fn overlay(inline: &ChartFormData, stored: ChartFormData) -> ChartFormData {
    let mut merged = stored;
    merged.datasource = inline.datasource.clone();
    for (key, value) in &inline.fields {
        merged.fields.insert(key.clone(), value.clone());
    }
    merged
}

/// Map a reqwest transport error onto the client error taxonomy.
fn map_transport_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout
    } else if e.is_connect() {
        ClientError::ConnectionFailed(e.to_string())
    } else {
        ClientError::ApiError(e.to_string())
    }
}

fn append_query_params(mut url: String, params: &HashMap<String, String>) -> String {
    let mut separator = if url.contains('?') { '&' } else { '?' };
    for (name, value) in params {
        url.push(separator);
        url.push_str(&urlencoding::encode(name));
        url.push('=');
        url.push_str(&urlencoding::encode(value));
        separator = '&';
    }
    url
}
