//! Scrape orchestration - the top-level harvesting loop
//!
//! This module drives per-project pagination, per-issue enrichment,
//! checkpoint updates, and cross-failure continuation:
//! - One project at a time, one page at a time, one enrichment at a time
//! - No persisted page offset: every run re-walks pagination from zero and
//!   relies on the checkpoint's scraped-key set to skip known issues, which
//!   keeps resume correct under total-count drift between runs
//! - Failures inside one project never abort the remaining projects

use crate::checkpoint::CheckpointStore;
use crate::client::{EnrichedIssue, IssueSummary, JiraClient};
use crate::config::Config;
use crate::scrape::sink::IssueSink;
use crate::{HarvestError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Issues enriched and handed to the sink during this run
    pub issues_emitted: u64,

    /// Projects whose full traversal finished this run
    pub projects_completed: u64,

    /// Projects left in progress (page failures, enrichment failures, or the
    /// safety cap); retried automatically on the next invocation
    pub projects_failed: u64,

    /// Whether the run stopped early on an external interrupt
    pub interrupted: bool,
}

/// How one project ended within a single run
#[derive(Debug, PartialEq, Eq)]
enum ProjectOutcome {
    /// Pagination exhausted with every issue scraped
    Completed,
    /// Left in progress; a later run picks it up
    InProgress,
    /// Shutdown was requested mid-project
    Interrupted,
}

/// Drives the whole scrape across all configured projects
pub struct ScrapeOrchestrator {
    client: JiraClient,
    checkpoint: Arc<CheckpointStore>,
    projects: Vec<String>,
    max_issues_per_project: u64,
    page_delay: Duration,
    error_pause: Duration,
    max_page_failures: u32,
    shutdown: Arc<AtomicBool>,
}

impl ScrapeOrchestrator {
    /// Creates a new orchestrator
    ///
    /// # Arguments
    ///
    /// * `client` - The API client (owns rate limiting and retries)
    /// * `checkpoint` - The durable progress store
    /// * `config` - Project list and pacing limits
    /// * `shutdown` - Flag set by the interrupt handler; checked between issues
    pub fn new(
        client: JiraClient,
        checkpoint: Arc<CheckpointStore>,
        config: &Config,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            client,
            checkpoint,
            projects: config.jira.projects.clone(),
            max_issues_per_project: config.limits.max_issues_per_project as u64,
            page_delay: Duration::from_millis(config.limits.page_delay_ms),
            error_pause: Duration::from_secs(config.limits.error_pause_secs),
            max_page_failures: config.limits.max_page_failures,
            shutdown: shutdown.clone(),
        }
    }

    /// Runs the scrape across all configured projects
    ///
    /// A failing health check aborts the whole run before any project state
    /// is touched. After that, each project is scraped in order; completed
    /// projects are skipped entirely, and a failure inside one project is
    /// logged, checkpointed, and followed by the next project.
    pub async fn run<S: IssueSink>(&self, sink: &mut S) -> Result<RunSummary> {
        if let Err(source) = self.client.health_check().await {
            return Err(HarvestError::HealthCheck {
                url: self.client.base_url().to_string(),
                source,
            });
        }
        tracing::info!("Service reachable; scraping {} projects", self.projects.len());

        let mut summary = RunSummary::default();

        for project in &self.projects {
            if self.shutdown.load(Ordering::Relaxed) {
                summary.interrupted = true;
                break;
            }

            if self.checkpoint.is_project_complete(project) {
                tracing::info!("Project {} already completed; skipping", project);
                continue;
            }

            match self.scrape_project(project, sink, &mut summary).await {
                Ok(ProjectOutcome::Completed) => summary.projects_completed += 1,
                Ok(ProjectOutcome::InProgress) => summary.projects_failed += 1,
                Ok(ProjectOutcome::Interrupted) => {
                    summary.interrupted = true;
                    break;
                }
                Err(e) => {
                    // Never abort the remaining projects over one failure
                    tracing::error!("Error scraping project {}: {}", project, e);
                    if let Err(save_err) = self.checkpoint.save() {
                        tracing::error!("Failed to save checkpoint: {}", save_err);
                    }
                    summary.projects_failed += 1;
                }
            }
        }

        if summary.interrupted {
            self.checkpoint.save()?;
        }
        sink.flush().map_err(HarvestError::Sink)?;

        tracing::info!(
            "Run finished: {} issues emitted, {} projects completed, {} in progress{}",
            summary.issues_emitted,
            summary.projects_completed,
            summary.projects_failed,
            if summary.interrupted { " (interrupted)" } else { "" }
        );
        Ok(summary)
    }

    /// Scrapes one project, paginating from offset zero
    async fn scrape_project<S: IssueSink>(
        &self,
        project: &str,
        sink: &mut S,
        summary: &mut RunSummary,
    ) -> Result<ProjectOutcome> {
        tracing::info!("Starting project {}", project);
        self.checkpoint.set_current_project(project)?;

        let mut start_at: u64 = 0;
        let mut processed: u64 = 0;
        let mut consecutive_page_failures: u32 = 0;
        let mut enrich_failures: u64 = 0;

        loop {
            let page = match self.client.list_issues(project, start_at).await {
                Ok(page) => {
                    consecutive_page_failures = 0;
                    page
                }
                Err(e) => {
                    consecutive_page_failures += 1;
                    tracing::error!(
                        "Failed to list {} at startAt={} ({}/{} consecutive): {}",
                        project,
                        start_at,
                        consecutive_page_failures,
                        self.max_page_failures,
                        e
                    );
                    self.checkpoint.save()?;
                    if consecutive_page_failures >= self.max_page_failures {
                        tracing::warn!("Giving up on {} for this run; will resume later", project);
                        return Ok(ProjectOutcome::InProgress);
                    }
                    // Pause, then retry the same offset
                    tokio::time::sleep(self.error_pause).await;
                    continue;
                }
            };

            if page.issues.is_empty() {
                tracing::info!("No more issues for {}", project);
                break;
            }

            let fetched = page.issues.len() as u64;
            let total = page.total;
            let page_start = page.start_at;

            for issue in page.issues {
                if self.shutdown.load(Ordering::Relaxed) {
                    tracing::info!("Shutdown requested; persisting state for {}", project);
                    self.checkpoint.save()?;
                    sink.flush().map_err(HarvestError::Sink)?;
                    return Ok(ProjectOutcome::Interrupted);
                }

                if self.checkpoint.is_issue_scraped(project, &issue.key) {
                    continue;
                }

                if !self.process_issue(project, issue, sink, summary).await? {
                    enrich_failures += 1;
                }

                processed += 1;
                if processed >= self.max_issues_per_project {
                    tracing::warn!(
                        "Reached safety cap of {} issues for {}; leaving project in progress",
                        self.max_issues_per_project,
                        project
                    );
                    return Ok(ProjectOutcome::InProgress);
                }
            }

            start_at = page_start + fetched;
            if start_at >= total {
                break;
            }

            // Fixed spacing between listing calls, independent of the rate
            // limiter, to reduce connection churn
            tokio::time::sleep(self.page_delay).await;
        }

        if enrich_failures > 0 {
            // Completion implies every issue is in the scraped set; the
            // missed ones get another chance on the next invocation
            tracing::warn!(
                "{} issues of {} failed enrichment; leaving project in progress",
                enrich_failures,
                project
            );
            return Ok(ProjectOutcome::InProgress);
        }

        self.checkpoint.mark_project_complete(project)?;
        tracing::info!(
            "Completed project {} ({} issues scraped in total)",
            project,
            self.checkpoint.scraped_count(project)
        );
        Ok(ProjectOutcome::Completed)
    }

    /// Enriches and emits one issue; returns whether it was emitted
    ///
    /// The issue is marked scraped strictly after successful emission, so a
    /// crash between the two re-fetches the issue instead of dropping it.
    async fn process_issue<S: IssueSink>(
        &self,
        project: &str,
        issue: IssueSummary,
        sink: &mut S,
        summary: &mut RunSummary,
    ) -> Result<bool> {
        let key = issue.key.clone();

        let comments = match self.client.fetch_comments(&key).await {
            Ok(comments) => comments,
            Err(e) => {
                // Leave the issue unscraped; a later run picks it up
                tracing::warn!("Failed to enrich {}: {}", key, e);
                return Ok(false);
            }
        };

        let enriched = EnrichedIssue::from_summary(issue, comments);
        sink.emit(&enriched).map_err(HarvestError::Sink)?;
        self.checkpoint.mark_issue_scraped(project, &key)?;
        summary.issues_emitted += 1;

        Ok(true)
    }
}
