//! Chart data provider implementation.
//!
//! Drives one fetch cycle per triggering event:
//! - Form data resolution: sequential, must finish before anything else
//! - Datasource metadata + query data: concurrent, joined (wait for both)
//! - Completion: callback first, then the state commit

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::{ChartClient, ChartInput, ClientError};
use crate::metrics;

use super::types::{
    ChartPayload, FailureCallback, LoadCallback, ProviderOptions, ProvisionState,
};

/// The chart data provider - resolves the full render payload for one chart
/// and exposes the in-flight status to the consumer.
///
/// Network I/O goes through the injected [`ChartClient`]; the provider owns
/// only its status and the last observed input identity. Fetch cycles run on
/// spawned tasks and are never cancelled: a re-trigger supersedes the
/// previous cycle's *status*, but the superseded task keeps running and its
/// late completion will overwrite a newer cycle's result. Consumers that
/// re-trigger rapidly must tolerate that overwrite.
pub struct ChartDataProvider {
    client: Arc<dyn ChartClient>,
    options: ProviderOptions,
    on_load: Option<LoadCallback>,
    on_failure: Option<FailureCallback>,
    state: Arc<RwLock<ProvisionState>>,
    current_input: RwLock<Option<ChartInput>>,
}

impl ChartDataProvider {
    /// Create a new provider. No fetch starts until [`initialize`] is called.
    ///
    /// [`initialize`]: ChartDataProvider::initialize
    pub fn new(client: Arc<dyn ChartClient>, options: ProviderOptions) -> Self {
        Self {
            client,
            options,
            on_load: None,
            on_failure: None,
            state: Arc::new(RwLock::new(ProvisionState::Uninitialized)),
            current_input: RwLock::new(None),
        }
    }

    /// Sets the callback invoked once per successfully completed cycle.
    pub fn with_on_load<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ChartPayload) + Send + Sync + 'static,
    {
        self.on_load = Some(Arc::new(callback));
        self
    }

    /// Sets the callback invoked once per failed cycle.
    pub fn with_on_failure<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ClientError) + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(callback));
        self
    }

    /// Store the input identity and begin the first fetch cycle.
    ///
    /// The status is `Loading` by the time this returns; completion is
    /// observed through [`current_status`] and the callbacks.
    ///
    /// [`current_status`]: ChartDataProvider::current_status
    pub async fn initialize(&self, input: ChartInput) {
        *self.current_input.write().await = Some(input.clone());
        self.start_cycle(input).await;
    }

    /// Notify the provider that the caller's input identity may have changed.
    ///
    /// Identity is compared by pointer ([`ChartInput::same_identity`]): if
    /// neither the inline form data reference nor the chart id reference
    /// differs from the last observed input, this is a no-op. Otherwise a new
    /// fetch cycle starts, superseding whatever the previous cycle reported.
    pub async fn input_changed(&self, new_input: ChartInput) {
        {
            let current = self.current_input.read().await;
            if let Some(ref previous) = *current {
                if previous.same_identity(&new_input) {
                    debug!("Input identity unchanged, skipping fetch cycle");
                    return;
                }
            }
        }

        *self.current_input.write().await = Some(new_input.clone());
        self.start_cycle(new_input).await;
    }

    /// Snapshot of the current state.
    ///
    /// `Loading` carries neither payload nor error, `Loaded` carries the
    /// payload only, `Error` carries the captured failure only.
    pub async fn current_status(&self) -> ProvisionState {
        self.state.read().await.clone()
    }

    /// Transition to `Loading` and run the fetch cycle on a spawned task.
    async fn start_cycle(&self, input: ChartInput) {
        let cycle = Uuid::new_v4();
        debug!(cycle = %cycle, client = self.client.name(), "Starting fetch cycle");

        // Committed before any network work so the consumer observes the
        // transition as soon as the triggering call returns.
        *self.state.write().await = ProvisionState::Loading {
            started_at: Utc::now(),
        };

        let client = Arc::clone(&self.client);
        let options = self.options.clone();
        let state = Arc::clone(&self.state);
        let on_load = self.on_load.clone();
        let on_failure = self.on_failure.clone();

        tokio::spawn(async move {
            let start = Instant::now();
            let result = Self::run_cycle(&client, &input, &options, cycle).await;
            let elapsed = start.elapsed().as_secs_f64();

            match result {
                Ok(payload) => {
                    metrics::PROVISION_CYCLES.with_label_values(&["loaded"]).inc();
                    metrics::PROVISION_DURATION
                        .with_label_values(&["loaded"])
                        .observe(elapsed);

                    // The callback sees the payload before the state commit,
                    // so a status read after the callback is consistent.
                    if let Some(ref callback) = on_load {
                        callback(&payload);
                    }
                    *state.write().await = ProvisionState::Loaded {
                        payload,
                        loaded_at: Utc::now(),
                    };
                    debug!(cycle = %cycle, "Fetch cycle complete");
                }
                Err(error) => {
                    metrics::PROVISION_CYCLES.with_label_values(&["error"]).inc();
                    metrics::PROVISION_DURATION
                        .with_label_values(&["error"])
                        .observe(elapsed);

                    warn!(cycle = %cycle, error = %error, "Fetch cycle failed");
                    if let Some(ref callback) = on_failure {
                        callback(&error);
                    }
                    *state.write().await = ProvisionState::Error {
                        error,
                        failed_at: Utc::now(),
                    };
                }
            }
        });
    }

    /// Run one fetch cycle: resolve the form data, then fetch datasource
    /// metadata and query data concurrently.
    async fn run_cycle(
        client: &Arc<dyn ChartClient>,
        input: &ChartInput,
        options: &ProviderOptions,
        cycle: Uuid,
    ) -> Result<ChartPayload, ClientError> {
        // Inline-only input needs no network call. A stored chart id, with
        // or without an inline overlay, goes through the client, which
        // decides precedence between the two.
        let form_data = match (input.form_data(), input.chart_id()) {
            (Some(inline), None) => inline.as_ref().clone(),
            _ => {
                client
                    .resolve_form_data(input, &options.form_data_options)
                    .await?
            }
        };

        debug!(cycle = %cycle, datasource = %form_data.datasource, "Form data resolved");

        // Both legs are issued before either is awaited; the join waits for
        // both to settle even when one fails early.
        let datasource_future = async {
            if options.load_datasource {
                Some(
                    client
                        .fetch_datasource(&form_data.datasource, &options.datasource_options)
                        .await,
                )
            } else {
                None
            }
        };
        let query_future = client.fetch_query_data(&form_data, &options.query_options);

        let (datasource_result, query_result) = future::join(datasource_future, query_future).await;

        // When both legs fail, which error wins is unspecified; this happens
        // to check the datasource leg first.
        let datasource = match datasource_result {
            Some(Ok(meta)) => Some(meta),
            Some(Err(error)) => return Err(error),
            None => None,
        };
        let query_data = query_result?;

        Ok(ChartPayload {
            form_data,
            query_data,
            datasource,
        })
    }
}
