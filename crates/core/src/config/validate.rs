use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - API base URL is present and http(s)
/// - Timeout is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.api.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "api.base_url cannot be empty".to_string(),
        ));
    }

    if !config.api.base_url.starts_with("http://") && !config.api.base_url.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "api.base_url must start with http:// or https://, got '{}'",
            config.api.base_url
        )));
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "api.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;

    fn config_with(base_url: &str, timeout_secs: u32) -> Config {
        Config {
            api: ApiConfig {
                base_url: base_url.to_string(),
                api_key: None,
                timeout_secs,
            },
        }
    }

    #[test]
    fn test_validate_valid_config() {
        let config = config_with("http://localhost:8088", 30);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_base_url_fails() {
        let config = config_with("", 30);
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_non_http_base_url_fails() {
        let config = config_with("ftp://charts", 30);
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let config = config_with("http://localhost:8088", 0);
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
