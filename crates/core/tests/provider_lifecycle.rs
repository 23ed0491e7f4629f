//! Provider lifecycle integration tests.
//!
//! These tests verify the complete fetch cycle through the provider:
//! uninitialized -> loading -> loaded | error, including re-triggers on
//! input change and the short-circuit/join behavior of the pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use plotline_core::{
    testing::{fixtures, MockChartClient, RecordedCall},
    ChartClient, ChartDataProvider, ChartFormData, ChartId, ChartInput, ClientError,
    ProviderOptions, ProvisionState, QueryData, RequestOptions,
};

/// Test helper bundling the mock client with provider construction.
struct TestHarness {
    client: Arc<MockChartClient>,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            client: Arc::new(MockChartClient::new()),
        }
    }

    fn create_provider(&self, options: ProviderOptions) -> ChartDataProvider {
        ChartDataProvider::new(Arc::clone(&self.client) as Arc<dyn ChartClient>, options)
    }

    fn id_input(&self, id: &str) -> ChartInput {
        ChartInput::from_chart_id(Arc::new(ChartId::new(id)))
    }

    fn inline_input(&self, datasource: &str) -> ChartInput {
        ChartInput::from_form_data(Arc::new(fixtures::form_data(datasource)))
    }
}

/// Poll the provider until it reaches a terminal state or the timeout runs
/// out, returning the last observed state either way.
async fn wait_for_terminal(provider: &ChartDataProvider, timeout: Duration) -> ProvisionState {
    let start = std::time::Instant::now();
    let poll_interval = Duration::from_millis(10);

    loop {
        let state = provider.current_status().await;
        if state.is_terminal() || start.elapsed() > timeout {
            return state;
        }
        tokio::time::sleep(poll_interval).await;
    }
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_identifier_only_input_resolves_full_payload() {
    let harness = TestHarness::new();
    harness
        .client
        .set_form_data(ChartFormData::new("ds1").with_field("id", json!("42")))
        .await;
    harness
        .client
        .set_query_data(QueryData::new(json!({"rows": [1, 2, 3]})))
        .await;

    let provider = harness.create_provider(ProviderOptions::default());
    provider.initialize(harness.id_input("42")).await;

    let state = wait_for_terminal(&provider, Duration::from_secs(2)).await;

    let payload = state.payload().expect("provider should reach loaded");
    assert_eq!(payload.form_data.datasource, "ds1");
    assert_eq!(payload.form_data.field("id"), Some(&json!("42")));
    assert_eq!(payload.query_data, QueryData::new(json!({"rows": [1, 2, 3]})));
    assert!(payload.datasource.is_none());

    // Exactly two network calls: form data resolution and query data.
    assert_eq!(harness.client.call_count().await, 2);
    assert_eq!(harness.client.resolve_count().await, 1);
    assert_eq!(harness.client.query_data_count().await, 1);
    assert_eq!(harness.client.datasource_count().await, 0);
}

#[tokio::test]
async fn test_status_is_uninitialized_only_before_initialize() {
    let harness = TestHarness::new();
    let provider = harness.create_provider(ProviderOptions::default());

    assert_eq!(
        provider.current_status().await.state_name(),
        "uninitialized"
    );

    provider.initialize(harness.inline_input("ds1")).await;

    // From here on the state is never uninitialized again.
    assert_ne!(
        provider.current_status().await.state_name(),
        "uninitialized"
    );
    let state = wait_for_terminal(&provider, Duration::from_secs(2)).await;
    assert_ne!(state.state_name(), "uninitialized");
}

#[tokio::test]
async fn test_datasource_fetched_when_requested() {
    let harness = TestHarness::new();
    harness.client.set_form_data(fixtures::form_data("ds1")).await;
    harness
        .client
        .set_datasource(fixtures::datasource_meta("ds1"))
        .await;

    let provider = harness.create_provider(ProviderOptions {
        load_datasource: true,
        ..Default::default()
    });
    provider.initialize(harness.id_input("42")).await;

    let state = wait_for_terminal(&provider, Duration::from_secs(2)).await;

    let payload = state.payload().expect("provider should reach loaded");
    let datasource = payload.datasource.as_ref().expect("datasource requested");
    assert_eq!(datasource.id, "ds1");
    assert_eq!(harness.client.call_count().await, 3);
}

#[tokio::test]
async fn test_resolve_failure_short_circuits_pipeline() {
    let harness = TestHarness::new();
    harness
        .client
        .set_resolve_error(ClientError::ConnectionFailed("refused".to_string()))
        .await;

    let failures = Arc::new(AtomicUsize::new(0));
    let failures_seen = Arc::clone(&failures);

    let provider = harness
        .create_provider(ProviderOptions {
            load_datasource: true,
            ..Default::default()
        })
        .with_on_failure(move |_| {
            failures_seen.fetch_add(1, Ordering::SeqCst);
        });
    provider.initialize(harness.id_input("42")).await;

    let state = wait_for_terminal(&provider, Duration::from_secs(2)).await;

    assert!(matches!(
        state.error(),
        Some(ClientError::ConnectionFailed(_))
    ));
    assert_eq!(failures.load(Ordering::SeqCst), 1);

    // Neither parallel fetch ever started.
    assert_eq!(harness.client.datasource_count().await, 0);
    assert_eq!(harness.client.query_data_count().await, 0);
}

#[tokio::test]
async fn test_both_parallel_failures_report_one_error() {
    let harness = TestHarness::new();
    harness.client.set_form_data(fixtures::form_data("ds1")).await;
    harness.client.set_datasource_error(ClientError::Timeout).await;
    harness
        .client
        .set_query_error(ClientError::ApiError("HTTP 500".to_string()))
        .await;

    let failures = Arc::new(AtomicUsize::new(0));
    let failures_seen = Arc::clone(&failures);

    let provider = harness
        .create_provider(ProviderOptions {
            load_datasource: true,
            ..Default::default()
        })
        .with_on_failure(move |_| {
            failures_seen.fetch_add(1, Ordering::SeqCst);
        });
    provider.initialize(harness.id_input("42")).await;

    let state = wait_for_terminal(&provider, Duration::from_secs(2)).await;

    // Either failure may win; asserting which one would overconstrain the
    // contract.
    assert!(matches!(
        state.error(),
        Some(ClientError::Timeout) | Some(ClientError::ApiError(_))
    ));
    assert_eq!(failures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unchanged_input_reference_is_noop() {
    let harness = TestHarness::new();
    let provider = harness.create_provider(ProviderOptions::default());

    let input = harness.inline_input("ds1");
    provider.initialize(input.clone()).await;
    let state = wait_for_terminal(&provider, Duration::from_secs(2)).await;
    assert_eq!(state.state_name(), "loaded");

    let calls_before = harness.client.call_count().await;

    // A clone shares the same Arcs, so the identity is unchanged.
    provider.input_changed(input.clone()).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(harness.client.call_count().await, calls_before);
    assert_eq!(provider.current_status().await.state_name(), "loaded");
}

#[tokio::test]
async fn test_new_inline_reference_restarts_cycle() {
    let harness = TestHarness::new();
    let provider = harness.create_provider(ProviderOptions::default());

    provider.initialize(harness.inline_input("ds1")).await;
    let state = wait_for_terminal(&provider, Duration::from_secs(2)).await;
    assert_eq!(state.state_name(), "loaded");

    // Slow the mock down so the loading window is observable.
    harness
        .client
        .set_call_delay(Duration::from_millis(200))
        .await;

    // Equal content, new allocation: a new identity.
    provider.input_changed(harness.inline_input("ds1")).await;

    assert_eq!(provider.current_status().await.state_name(), "loading");

    let state = wait_for_terminal(&provider, Duration::from_secs(2)).await;
    assert_eq!(state.state_name(), "loaded");
    assert_eq!(harness.client.query_data_count().await, 2);
}

#[tokio::test]
async fn test_loading_is_observable_before_any_completion() {
    let harness = TestHarness::new();
    harness
        .client
        .set_call_delay(Duration::from_millis(200))
        .await;

    let provider = harness.create_provider(ProviderOptions::default());
    provider.initialize(harness.inline_input("ds1")).await;

    let state = provider.current_status().await;
    assert_eq!(state.state_name(), "loading");
    assert!(state.payload().is_none());
    assert!(state.error().is_none());

    let state = wait_for_terminal(&provider, Duration::from_secs(2)).await;
    assert_eq!(state.state_name(), "loaded");
}

#[tokio::test]
async fn test_datasource_failure_fails_cycle_but_query_still_issued() {
    let harness = TestHarness::new();
    harness.client.set_form_data(fixtures::form_data("dsX")).await;
    harness.client.set_datasource_error(ClientError::Timeout).await;

    let failures = Arc::new(AtomicUsize::new(0));
    let failures_seen = Arc::clone(&failures);

    let provider = harness
        .create_provider(ProviderOptions {
            load_datasource: true,
            ..Default::default()
        })
        .with_on_failure(move |_| {
            failures_seen.fetch_add(1, Ordering::SeqCst);
        });
    provider.initialize(harness.id_input("7")).await;

    let state = wait_for_terminal(&provider, Duration::from_secs(2)).await;

    assert!(matches!(state.error(), Some(ClientError::Timeout)));
    assert_eq!(failures.load(Ordering::SeqCst), 1);

    // The query leg was already in flight when the datasource leg failed;
    // its successful result is discarded.
    assert_eq!(harness.client.query_data_count().await, 1);
}

#[tokio::test]
async fn test_inline_only_input_skips_resolve_call() {
    let harness = TestHarness::new();
    let provider = harness.create_provider(ProviderOptions::default());

    provider.initialize(harness.inline_input("ds1")).await;
    let state = wait_for_terminal(&provider, Duration::from_secs(2)).await;

    let payload = state.payload().expect("provider should reach loaded");
    assert_eq!(payload.form_data.datasource, "ds1");
    assert_eq!(harness.client.resolve_count().await, 0);
    assert_eq!(harness.client.query_data_count().await, 1);
}

#[tokio::test]
async fn test_inline_and_stored_id_both_pass_through_resolve() {
    let harness = TestHarness::new();
    harness
        .client
        .set_form_data(ChartFormData::new("ds_merged"))
        .await;

    let provider = harness.create_provider(ProviderOptions::default());
    let input = ChartInput::new(
        Some(Arc::new(fixtures::form_data("ds_inline"))),
        Some(Arc::new(ChartId::new("42"))),
    )
    .unwrap();
    provider.initialize(input).await;

    let state = wait_for_terminal(&provider, Duration::from_secs(2)).await;

    // Exactly one resolve call, carrying both pieces untouched.
    assert_eq!(harness.client.resolve_count().await, 1);
    let calls = harness.client.recorded_calls().await;
    match &calls[0] {
        RecordedCall::ResolveFormData {
            chart_id, inline, ..
        } => {
            assert_eq!(chart_id.as_ref().map(|id| id.as_str()), Some("42"));
            assert_eq!(
                inline.as_ref().map(|fd| fd.datasource.as_str()),
                Some("ds_inline")
            );
        }
        other => panic!("expected a resolve call first, got {:?}", other),
    }

    // The resolved form data, not the inline one, feeds the payload.
    let payload = state.payload().expect("provider should reach loaded");
    assert_eq!(payload.form_data.datasource, "ds_merged");
}

#[tokio::test]
async fn test_load_callback_fires_once_per_completed_cycle() {
    let harness = TestHarness::new();

    let loads = Arc::new(AtomicUsize::new(0));
    let loads_seen = Arc::clone(&loads);

    let provider = harness
        .create_provider(ProviderOptions::default())
        .with_on_load(move |payload| {
            assert_eq!(payload.form_data.datasource, "ds1");
            loads_seen.fetch_add(1, Ordering::SeqCst);
        });

    provider.initialize(harness.inline_input("ds1")).await;
    wait_for_terminal(&provider, Duration::from_secs(2)).await;
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    provider.input_changed(harness.inline_input("ds1")).await;
    wait_for_terminal(&provider, Duration::from_secs(2)).await;
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_new_cycle_overwrites_previous_error() {
    let harness = TestHarness::new();
    harness
        .client
        .set_resolve_error(ClientError::ConnectionFailed("refused".to_string()))
        .await;

    let provider = harness.create_provider(ProviderOptions::default());
    provider.initialize(harness.id_input("42")).await;

    let state = wait_for_terminal(&provider, Duration::from_secs(2)).await;
    assert_eq!(state.state_name(), "error");

    // The injected error was consumed; a re-trigger now succeeds and
    // replaces the terminal error state.
    harness.client.set_form_data(fixtures::form_data("ds1")).await;
    provider.input_changed(harness.id_input("42")).await;

    let state = wait_for_terminal(&provider, Duration::from_secs(2)).await;
    assert_eq!(state.state_name(), "loaded");
    assert!(state.error().is_none());
}

#[tokio::test]
async fn test_per_fetch_options_are_passed_through() {
    let harness = TestHarness::new();
    harness.client.set_form_data(fixtures::form_data("ds1")).await;

    let options = ProviderOptions {
        load_datasource: true,
        form_data_options: RequestOptions::default().with_header("X-Trace", "abc"),
        datasource_options: RequestOptions::default().with_timeout(7),
        query_options: RequestOptions::default().with_query_param("force", "true"),
    };

    let provider = harness.create_provider(options);
    provider.initialize(harness.id_input("42")).await;
    wait_for_terminal(&provider, Duration::from_secs(2)).await;

    let calls = harness.client.recorded_calls().await;
    assert_eq!(calls.len(), 3);
    for call in &calls {
        match call {
            RecordedCall::ResolveFormData { options, .. } => {
                assert_eq!(options.headers.get("X-Trace").map(String::as_str), Some("abc"));
            }
            RecordedCall::FetchDatasource { options, .. } => {
                assert_eq!(options.timeout_secs, Some(7));
            }
            RecordedCall::FetchQueryData { options, .. } => {
                assert_eq!(
                    options.query_params.get("force").map(String::as_str),
                    Some("true")
                );
            }
        }
    }
}
