//! Checkpoint module for tracking scraping progress
//!
//! This module provides the durable record of per-project completion and
//! per-issue "already fetched" membership that makes interrupted runs
//! resumable without duplicates.

mod store;

// Re-export main types
pub use store::{Checkpoint, CheckpointError, CheckpointResult, CheckpointStore, ProjectProgress};
