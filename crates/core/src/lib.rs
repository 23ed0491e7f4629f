//! Core contracts for plotline.
//!
//! This crate contains:
//! - The chart API client boundary (trait, data shapes, HTTP backend)
//! - The chart data provider and its status state machine
//! - Configuration loading and validation
//! - Prometheus metrics and mock clients for testing

pub mod client;
pub mod config;
pub mod metrics;
pub mod provider;
pub mod testing;

pub use client::{
    ChartClient, ChartFormData, ChartId, ChartInput, ClientError, DatasourceMeta, HttpChartClient,
    QueryData, RequestOptions,
};
pub use config::{
    load_config, load_config_from_str, validate_config, ApiConfig, Config, ConfigError,
    SanitizedConfig,
};
pub use provider::{
    ChartDataProvider, ChartPayload, FailureCallback, LoadCallback, ProviderOptions,
    ProvisionState,
};
