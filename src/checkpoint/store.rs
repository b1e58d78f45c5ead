//! Durable checkpoint store for crash-safe resume
//!
//! The checkpoint is a single JSON document recording, per project, the set
//! of issue keys already scraped, plus the set of completed projects and a
//! global counter. It is rewritten after every mutation: heavy write
//! amplification, but a crash loses at most the single in-flight issue.
//! Saves go through a sibling temp file followed by a rename, so an
//! interrupted save never leaves an unparseable snapshot behind.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Errors that can occur while persisting the checkpoint
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// The persisted scraping state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Checkpoint {
    /// RFC 3339 timestamp of the last save
    #[serde(default)]
    pub last_updated: Option<String>,

    /// Per-project progress, keyed by project key
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectProgress>,

    /// Projects whose full issue set has been scraped
    #[serde(default)]
    pub completed_projects: BTreeSet<String>,

    /// Project being scraped when the state was last saved
    #[serde(default)]
    pub current_project: Option<String>,

    /// Total issues scraped across all projects and runs
    #[serde(default)]
    pub total_issues_scraped: u64,
}

/// Progress within one project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectProgress {
    /// Issue keys already fetched, enriched and emitted
    #[serde(default)]
    pub scraped_issues: BTreeSet<String>,
}

/// Store owning the checkpoint document and its file path
///
/// All mutation is serialized through an internal lock, so a future
/// parallel-across-projects orchestrator stays correct without redesign.
pub struct CheckpointStore {
    path: PathBuf,
    state: Mutex<Checkpoint>,
}

impl CheckpointStore {
    /// Opens the store, loading existing state from `path` if present
    ///
    /// A missing or corrupt file is never fatal: scraping starts from an
    /// empty state and the dedup logic absorbs the re-fetch cost.
    pub fn load(path: &Path) -> Self {
        let state = match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Checkpoint>(&content) {
                Ok(checkpoint) => {
                    tracing::info!(
                        "Loaded checkpoint from {} ({} issues scraped so far)",
                        path.display(),
                        checkpoint.total_issues_scraped
                    );
                    checkpoint
                }
                Err(e) => {
                    tracing::warn!(
                        "Checkpoint at {} is corrupt ({}); starting fresh",
                        path.display(),
                        e
                    );
                    Checkpoint::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No checkpoint at {}; starting fresh", path.display());
                Checkpoint::default()
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read checkpoint at {} ({}); starting fresh",
                    path.display(),
                    e
                );
                Checkpoint::default()
            }
        };

        Self {
            path: path.to_path_buf(),
            state: Mutex::new(state),
        }
    }

    /// Whether a project's full issue set has been scraped
    pub fn is_project_complete(&self, project: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .completed_projects
            .contains(project)
    }

    /// Whether one issue has already been scraped
    pub fn is_issue_scraped(&self, project: &str, issue_key: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .projects
            .get(project)
            .is_some_and(|p| p.scraped_issues.contains(issue_key))
    }

    /// Records one scraped issue and persists the state
    ///
    /// Idempotent: re-marking an already-present key leaves both the set and
    /// the global counter unchanged and skips the save.
    pub fn mark_issue_scraped(&self, project: &str, issue_key: &str) -> CheckpointResult<()> {
        {
            let mut state = self.state.lock().unwrap();
            let inserted = state
                .projects
                .entry(project.to_string())
                .or_default()
                .scraped_issues
                .insert(issue_key.to_string());

            if !inserted {
                return Ok(());
            }
            state.total_issues_scraped += 1;
        }
        self.save()
    }

    /// Marks a project's traversal as complete and persists the state
    pub fn mark_project_complete(&self, project: &str) -> CheckpointResult<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.completed_projects.insert(project.to_string());
            if state.current_project.as_deref() == Some(project) {
                state.current_project = None;
            }
        }
        self.save()
    }

    /// Records the project currently being scraped and persists the state
    pub fn set_current_project(&self, project: &str) -> CheckpointResult<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.current_project = Some(project.to_string());
        }
        self.save()
    }

    /// Number of scraped issues recorded for one project
    pub fn scraped_count(&self, project: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .projects
            .get(project)
            .map_or(0, |p| p.scraped_issues.len())
    }

    /// Total issues scraped across all projects and runs
    pub fn total_scraped(&self) -> u64 {
        self.state.lock().unwrap().total_issues_scraped
    }

    /// Clone of the full state, for status reporting
    pub fn snapshot(&self) -> Checkpoint {
        self.state.lock().unwrap().clone()
    }

    /// Serializes the full state to disk, overwriting the previous snapshot
    ///
    /// Write-then-rename: the new document lands in a sibling temp file
    /// first, then replaces the old one atomically.
    pub fn save(&self) -> CheckpointResult<()> {
        let json = {
            let mut state = self.state.lock().unwrap();
            state.last_updated = Some(Utc::now().to_rfc3339());
            serde_json::to_string_pretty(&*state)?
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!("Checkpoint saved to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::load(&dir.path().join("checkpoint.json"));

        assert_eq!(store.total_scraped(), 0);
        assert!(!store.is_project_complete("SPARK"));
        assert!(!store.is_issue_scraped("SPARK", "SPARK-1"));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = CheckpointStore::load(&path);
        assert_eq!(store.total_scraped(), 0);

        // Forward progress still works: the next save replaces the corrupt file
        store.mark_issue_scraped("SPARK", "SPARK-1").unwrap();
        let reloaded = CheckpointStore::load(&path);
        assert!(reloaded.is_issue_scraped("SPARK", "SPARK-1"));
    }

    #[test]
    fn test_mark_issue_scraped_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::load(&dir.path().join("checkpoint.json"));

        store.mark_issue_scraped("SPARK", "SPARK-1").unwrap();
        assert_eq!(store.scraped_count("SPARK"), 1);
        assert_eq!(store.total_scraped(), 1);

        // Re-marking changes neither the set nor the counter
        store.mark_issue_scraped("SPARK", "SPARK-1").unwrap();
        assert_eq!(store.scraped_count("SPARK"), 1);
        assert_eq!(store.total_scraped(), 1);

        store.mark_issue_scraped("SPARK", "SPARK-2").unwrap();
        assert_eq!(store.scraped_count("SPARK"), 2);
        assert_eq!(store.total_scraped(), 2);
    }

    #[test]
    fn test_counter_spans_projects() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::load(&dir.path().join("checkpoint.json"));

        store.mark_issue_scraped("SPARK", "SPARK-1").unwrap();
        store.mark_issue_scraped("KAFKA", "KAFKA-1").unwrap();

        assert_eq!(store.scraped_count("SPARK"), 1);
        assert_eq!(store.scraped_count("KAFKA"), 1);
        assert_eq!(store.total_scraped(), 2);
    }

    #[test]
    fn test_project_complete_survives_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        {
            let store = CheckpointStore::load(&path);
            store.mark_issue_scraped("SPARK", "SPARK-1").unwrap();
            store.mark_project_complete("SPARK").unwrap();
        }

        let reloaded = CheckpointStore::load(&path);
        assert!(reloaded.is_project_complete("SPARK"));
        assert!(reloaded.is_issue_scraped("SPARK", "SPARK-1"));
        assert_eq!(reloaded.total_scraped(), 1);
    }

    #[test]
    fn test_current_project_cleared_on_completion() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::load(&dir.path().join("checkpoint.json"));

        store.set_current_project("SPARK").unwrap();
        assert_eq!(store.snapshot().current_project.as_deref(), Some("SPARK"));

        store.mark_project_complete("SPARK").unwrap();
        assert_eq!(store.snapshot().current_project, None);
    }

    #[test]
    fn test_persisted_document_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        let store = CheckpointStore::load(&path);
        store.mark_issue_scraped("SPARK", "SPARK-1").unwrap();
        store.mark_project_complete("SPARK").unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert!(doc["last_updated"].is_string());
        assert_eq!(doc["projects"]["SPARK"]["scraped_issues"][0], "SPARK-1");
        assert_eq!(doc["completed_projects"][0], "SPARK");
        assert_eq!(doc["total_issues_scraped"], 1);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        let store = CheckpointStore::load(&path);
        store.save().unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("checkpoint.json.tmp").exists());
    }
}
