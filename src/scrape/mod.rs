//! Scrape module for the harvesting pipeline
//!
//! This module contains the top-level orchestration logic, including:
//! - Per-project pagination and per-issue enrichment
//! - Checkpoint updates and cross-failure continuation
//! - The output sink seam toward downstream transformation

mod orchestrator;
mod sink;

pub use orchestrator::{RunSummary, ScrapeOrchestrator};
pub use sink::{IssueSink, JsonlSink};
