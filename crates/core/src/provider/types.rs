//! Types for the chart data provider.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::client::{ChartFormData, ClientError, DatasourceMeta, QueryData, RequestOptions};

/// Options fixed at provider construction time.
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    /// Whether to fetch datasource metadata alongside the query data.
    pub load_datasource: bool,
    /// Request options for the form data resolution fetch.
    pub form_data_options: RequestOptions,
    /// Request options for the datasource metadata fetch.
    pub datasource_options: RequestOptions,
    /// Request options for the query data fetch.
    pub query_options: RequestOptions,
}

/// The full render payload assembled by one successful fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPayload {
    /// Resolved chart configuration.
    pub form_data: ChartFormData,
    /// Query result data.
    pub query_data: QueryData,
    /// Datasource metadata, present only when requested via
    /// [`ProviderOptions::load_datasource`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasource: Option<DatasourceMeta>,
}

/// Current state of the provider.
///
/// Exactly one variant holds at any observation point. The provider starts
/// `Uninitialized`, moves to `Loading` at the start of every fetch cycle
/// (including re-triggers), and settles in `Loaded` or `Error` at the end of
/// the cycle. A new cycle overwrites the previous terminal state; there are
/// no other transitions.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProvisionState {
    /// No fetch cycle has been started yet.
    Uninitialized,

    /// A fetch cycle is in flight.
    Loading { started_at: DateTime<Utc> },

    /// The last cycle completed; the payload is ready to render.
    Loaded {
        payload: ChartPayload,
        loaded_at: DateTime<Utc>,
    },

    /// The last cycle failed with the captured error.
    Error {
        error: ClientError,
        failed_at: DateTime<Utc>,
    },
}

impl ProvisionState {
    /// Lowercase state name, matching the serialized `status` tag.
    pub fn state_name(&self) -> &'static str {
        match self {
            ProvisionState::Uninitialized => "uninitialized",
            ProvisionState::Loading { .. } => "loading",
            ProvisionState::Loaded { .. } => "loaded",
            ProvisionState::Error { .. } => "error",
        }
    }

    /// Whether the state is the end of a cycle (loaded or error).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProvisionState::Loaded { .. } | ProvisionState::Error { .. }
        )
    }

    /// The payload, when loaded.
    pub fn payload(&self) -> Option<&ChartPayload> {
        match self {
            ProvisionState::Loaded { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// The captured failure, when in the error state.
    pub fn error(&self) -> Option<&ClientError> {
        match self {
            ProvisionState::Error { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Callback invoked with the payload when a fetch cycle succeeds.
pub type LoadCallback = Arc<dyn Fn(&ChartPayload) + Send + Sync>;

/// Callback invoked with the captured error when a fetch cycle fails.
pub type FailureCallback = Arc<dyn Fn(&ClientError) + Send + Sync>;
