use serde::Deserialize;

/// Main configuration structure for Jira-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub jira: JiraConfig,
    pub limits: LimitsConfig,
    pub output: OutputConfig,
}

/// Jira service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JiraConfig {
    /// Base URL of the Jira REST API (e.g. "https://issues.apache.org/jira/rest/api/2")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Project keys to scrape, in order
    pub projects: Vec<String>,
}

/// Rate, retry, timeout and pagination limits
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum API calls within one rolling window
    #[serde(rename = "requests-per-window")]
    pub requests_per_window: u32,

    /// Length of the rolling rate-limit window in seconds
    #[serde(rename = "window-secs", default = "default_window_secs")]
    pub window_secs: f64,

    /// Maximum additional retry attempts after the first failure
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Initial backoff delay in seconds
    #[serde(rename = "initial-retry-delay-secs", default = "default_initial_retry_delay")]
    pub initial_retry_delay_secs: f64,

    /// Backoff delay ceiling in seconds
    #[serde(rename = "max-retry-delay-secs", default = "default_max_retry_delay")]
    pub max_retry_delay_secs: f64,

    /// Exponential backoff base
    #[serde(rename = "retry-backoff-base", default = "default_backoff_base")]
    pub retry_backoff_base: f64,

    /// Timeout for establishing a connection, in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Timeout for the whole request (waiting on response bytes), in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Issues requested per listing call
    #[serde(rename = "page-size")]
    pub page_size: u32,

    /// Hard cap on issues processed per project per run
    #[serde(rename = "max-issues-per-project")]
    pub max_issues_per_project: u32,

    /// Fixed delay between page fetches, in milliseconds
    #[serde(rename = "page-delay-ms", default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Pause after a page-level failure before retrying the same offset, in seconds
    #[serde(rename = "error-pause-secs", default = "default_error_pause_secs")]
    pub error_pause_secs: u64,

    /// Consecutive page failures tolerated before giving up on a project
    #[serde(rename = "max-page-failures", default = "default_max_page_failures")]
    pub max_page_failures: u32,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSON checkpoint document
    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: String,

    /// Path to the JSONL issues output file
    #[serde(rename = "issues-path")]
    pub issues_path: String,
}

fn default_window_secs() -> f64 {
    1.0
}

fn default_initial_retry_delay() -> f64 {
    1.0
}

fn default_max_retry_delay() -> f64 {
    60.0
}

fn default_backoff_base() -> f64 {
    2.0
}

fn default_page_delay_ms() -> u64 {
    300
}

fn default_error_pause_secs() -> u64 {
    5
}

fn default_max_page_failures() -> u32 {
    3
}
