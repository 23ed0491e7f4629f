//! Configuration loading and validation.

mod loader;
mod types;
mod validate;

use thiserror::Error;

pub use loader::{load_config, load_config_from_str};
pub use types::{ApiConfig, Config, SanitizedApiConfig, SanitizedConfig};
pub use validate::validate_config;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file does not exist.
    #[error("config file not found: {0}")]
    FileNotFound(String),

    /// Config file or string could not be parsed.
    #[error("failed to parse config: {0}")]
    ParseError(String),

    /// Config parsed but failed validation.
    #[error("invalid config: {0}")]
    ValidationError(String),
}
