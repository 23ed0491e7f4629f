use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub api: ApiConfig,
}

/// Chart API server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the dashboard server (e.g., "http://localhost:8088")
    pub base_url: String,
    /// API key sent with every request (optional)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Default request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Sanitized config for display/API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub api: SanitizedApiConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedApiConfig {
    pub base_url: String,
    pub api_key_set: bool,
    pub timeout_secs: u32,
}

impl Config {
    pub fn sanitized(&self) -> SanitizedConfig {
        SanitizedConfig {
            api: SanitizedApiConfig {
                base_url: self.api.base_url.clone(),
                api_key_set: self.api.api_key.is_some(),
                timeout_secs: self.api.timeout_secs,
            },
        }
    }
}
