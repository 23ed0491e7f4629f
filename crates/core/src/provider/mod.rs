//! Chart data provisioning.
//!
//! The provider coordinates the dependent and parallel fetches a chart
//! render needs and exposes the in-flight status through a small state
//! machine:
//! - **Form data**: resolved first, from inline input or the stored chart
//! - **Datasource metadata + query data**: fetched concurrently once the
//!   form data is known (join semantics, not race)
//! - **Status**: uninitialized -> loading -> loaded | error, re-entering
//!   loading on every re-trigger

mod runner;
mod types;

pub use runner::ChartDataProvider;
pub use types::{ChartPayload, FailureCallback, LoadCallback, ProviderOptions, ProvisionState};
