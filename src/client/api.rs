//! Jira REST API client
//!
//! Every request flows through the rate limiter first, then the retry policy.
//! Two independent timeouts bound each request: one on connection
//! establishment, one on the whole exchange.

use crate::client::models::{Comment, CommentsResponse, Page, RawComment};
use crate::client::rate_limit::RateLimiter;
use crate::client::retry::{retry_with_backoff, RetryPolicy};
use crate::config::LimitsConfig;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Fields requested from the listing endpoint
const ISSUE_FIELDS: &[&str] = &[
    "summary",
    "description",
    "status",
    "priority",
    "assignee",
    "reporter",
    "created",
    "updated",
    "resolutiondate",
    "labels",
    "components",
    "fixVersions",
    "issuetype",
    "project",
    "comment",
];

/// Fallback wait when a 429 response carries no usable Retry-After header
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Errors produced by API calls
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection failure, timeout, reset, or truncated body
    #[error("Transport error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    /// HTTP 429 that persisted past the server-specified wait
    #[error("Rate limited by server for {url}")]
    RateLimited { url: String },

    /// HTTP 5xx
    #[error("HTTP {status} (server error) for {url}")]
    Server { status: u16, url: String },

    /// HTTP 4xx other than 404 and 429
    #[error("HTTP {status} for {url}")]
    Client { status: u16, url: String },

    /// HTTP 404 on a single-resource lookup
    #[error("Resource not found: {url}")]
    NotFound { url: String },

    /// Failed to construct the HTTP client
    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

impl ApiError {
    /// Whether the failure class is worth another attempt
    ///
    /// Retryable: connect/read timeouts, connection resets, truncated or
    /// undecodable bodies, HTTP 429, HTTP 5xx. Everything else is fatal for
    /// the call and surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport { source, .. } => {
                source.is_timeout()
                    || source.is_connect()
                    || source.is_body()
                    || source.is_decode()
                    || source.is_request()
            }
            ApiError::RateLimited { .. } | ApiError::Server { .. } => true,
            ApiError::Client { .. } | ApiError::NotFound { .. } | ApiError::Build(_) => false,
        }
    }
}

/// Client for the Jira REST API
pub struct JiraClient {
    http: Client,
    base_url: String,
    rate_limiter: RateLimiter,
    retry: RetryPolicy,
    page_size: u32,
}

impl JiraClient {
    /// Creates a new client
    ///
    /// # Arguments
    ///
    /// * `base_url` - Root of the REST API, e.g. `https://issues.apache.org/jira/rest/api/2`
    /// * `limits` - Rate, retry and timeout configuration
    pub fn new(base_url: &str, limits: &LimitsConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(format!("jira-harvest/{}", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(limits.connect_timeout_secs))
            .timeout(Duration::from_secs(limits.request_timeout_secs))
            .pool_max_idle_per_host(10)
            .gzip(true)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::new(
                limits.requests_per_window,
                Duration::from_secs_f64(limits.window_secs),
            ),
            retry: RetryPolicy::from_limits(limits),
            page_size: limits.page_size,
        })
    }

    /// Returns the configured API root
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Lists one page of a project's issues, ordered by ascending creation time
    ///
    /// # Arguments
    ///
    /// * `project_key` - Jira project key (e.g. "SPARK")
    /// * `start_at` - Offset of the first issue to return
    ///
    /// # Returns
    ///
    /// * `Ok(Page)` - One window of issue summaries plus the matching total
    /// * `Err(ApiError)` - Retries exhausted or a fatal response; the
    ///   orchestrator owns page-level failure handling
    pub async fn list_issues(&self, project_key: &str, start_at: u64) -> Result<Page, ApiError> {
        let jql = format!("project={} ORDER BY created ASC", project_key);
        let params = [
            ("jql", jql),
            ("startAt", start_at.to_string()),
            ("maxResults", self.page_size.to_string()),
            ("fields", ISSUE_FIELDS.join(",")),
        ];

        retry_with_backoff(&self.retry, "list_issues", || {
            self.get_json::<Page>("search", &params)
        })
        .await
    }

    /// Fetches all comments of one issue, in creation order
    ///
    /// A 404 is not an error here: a missing comment resource yields an empty
    /// sequence so enrichment can continue. Exhausted retries surface as an
    /// error so the caller can leave the issue unscraped for a later run.
    pub async fn fetch_comments(&self, issue_key: &str) -> Result<Vec<Comment>, ApiError> {
        let endpoint = format!("issue/{}/comment", issue_key);

        let result = retry_with_backoff(&self.retry, "fetch_comments", || {
            self.get_json::<CommentsResponse>(&endpoint, &[])
        })
        .await;

        match result {
            Ok(response) => Ok(response
                .comments
                .into_iter()
                .map(RawComment::normalize)
                .collect()),
            Err(ApiError::NotFound { url }) => {
                tracing::warn!("No comment resource at {}; treating as empty", url);
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Lightweight availability check, used once before a run
    ///
    /// Retried like any other call, so a transient blip does not abort a run
    /// that would otherwise succeed. Exhausted retries fail the whole run.
    pub async fn health_check(&self) -> Result<(), ApiError> {
        retry_with_backoff(&self.retry, "health_check", || {
            self.get_json::<serde_json::Value>("serverInfo", &[])
        })
        .await?;
        Ok(())
    }

    /// Rate-limited GET returning a decoded JSON body
    ///
    /// A 429 carrying Retry-After is honored inline: sleep the advertised
    /// duration, then resend once immediately. A second 429 surfaces as a
    /// retryable error and falls back to the caller's backoff.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.rate_limiter.wait_if_needed().await;

        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        let mut response = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                url: url.clone(),
                source: e,
            })?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let wait = parse_retry_after(response.headers()).unwrap_or(DEFAULT_RETRY_AFTER);
            tracing::warn!("Rate limited by server; waiting {:?} before resending {}", wait, url);
            tokio::time::sleep(wait).await;
            response = self
                .http
                .get(&url)
                .query(params)
                .send()
                .await
                .map_err(|e| ApiError::Transport {
                    url: url.clone(),
                    source: e,
                })?;
        }

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound { url });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited { url });
        }
        if status.is_server_error() {
            return Err(ApiError::Server {
                status: status.as_u16(),
                url,
            });
        }
        if !status.is_success() {
            return Err(ApiError::Client {
                status: status.as_u16(),
                url,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Transport { url, source: e })
    }
}

/// Parses a Retry-After header given as whole seconds
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
