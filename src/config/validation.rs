use crate::config::types::{Config, JiraConfig, LimitsConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_jira_config(&config.jira)?;
    validate_limits_config(&config.limits)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the Jira service configuration
fn validate_jira_config(config: &JiraConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must be http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.projects.is_empty() {
        return Err(ConfigError::Validation(
            "projects cannot be empty".to_string(),
        ));
    }

    for key in &config.projects {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Validation(format!(
                "project keys must be non-empty and alphanumeric, got '{}'",
                key
            )));
        }
    }

    Ok(())
}

/// Validates rate, retry and pagination limits
fn validate_limits_config(config: &LimitsConfig) -> Result<(), ConfigError> {
    if config.requests_per_window < 1 {
        return Err(ConfigError::Validation(format!(
            "requests_per_window must be >= 1, got {}",
            config.requests_per_window
        )));
    }

    if config.window_secs <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "window_secs must be positive, got {}",
            config.window_secs
        )));
    }

    if config.initial_retry_delay_secs < 0.0 || config.max_retry_delay_secs < 0.0 {
        return Err(ConfigError::Validation(
            "retry delays cannot be negative".to_string(),
        ));
    }

    if config.retry_backoff_base < 1.0 {
        return Err(ConfigError::Validation(format!(
            "retry_backoff_base must be >= 1.0, got {}",
            config.retry_backoff_base
        )));
    }

    if config.connect_timeout_secs < 1 || config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeouts must be >= 1 second".to_string(),
        ));
    }

    // Jira caps maxResults at 1000
    if config.page_size < 1 || config.page_size > 1000 {
        return Err(ConfigError::Validation(format!(
            "page_size must be between 1 and 1000, got {}",
            config.page_size
        )));
    }

    if config.max_issues_per_project < 1 {
        return Err(ConfigError::Validation(format!(
            "max_issues_per_project must be >= 1, got {}",
            config.max_issues_per_project
        )));
    }

    if config.max_page_failures < 1 {
        return Err(ConfigError::Validation(format!(
            "max_page_failures must be >= 1, got {}",
            config.max_page_failures
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.checkpoint_path.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint_path cannot be empty".to_string(),
        ));
    }

    if config.issues_path.is_empty() {
        return Err(ConfigError::Validation(
            "issues_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
