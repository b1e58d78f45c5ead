//! Jira-Harvest: a resumable, rate-limited Jira issue scraper
//!
//! This crate downloads every issue of a set of Jira projects through the
//! paginated REST search API, bounding the outbound call rate, retrying
//! transient failures with exponential backoff, and checkpointing progress so
//! an interrupted multi-hour run resumes without duplicates.

pub mod checkpoint;
pub mod client;
pub mod config;
pub mod scrape;

use thiserror::Error;

/// Main error type for Jira-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] client::ApiError),

    #[error("Health check against {url} failed: {source}")]
    HealthCheck {
        url: String,
        source: client::ApiError,
    },

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] checkpoint::CheckpointError),

    #[error("Output sink error: {0}")]
    Sink(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Jira-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use checkpoint::CheckpointStore;
pub use client::{ApiError, JiraClient, RateLimiter, RetryPolicy};
pub use config::Config;
pub use scrape::{IssueSink, JsonlSink, RunSummary, ScrapeOrchestrator};
