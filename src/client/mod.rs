//! API client module for the Jira REST interface
//!
//! This module contains the network-facing layer, including:
//! - Sliding-window rate limiting
//! - Retry with exponential backoff and error classification
//! - The typed API client for listing, comment and health-check calls
//! - Wire models validated once at the client boundary

mod api;
mod models;
mod rate_limit;
mod retry;

pub use api::{ApiError, JiraClient};
pub use models::{Comment, EnrichedIssue, IssueFields, IssueSummary, Page};
pub use rate_limit::RateLimiter;
pub use retry::{retry_with_backoff, RetryPolicy};
