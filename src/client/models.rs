//! Wire types for the Jira REST API
//!
//! Payloads are loosely-typed nested JSON on the wire; they are validated and
//! normalized here, once, at the client boundary. Everything downstream works
//! with `EnrichedIssue`, where nested names have been flattened and absent
//! values defaulted to empty strings.

use serde::{Deserialize, Serialize};

/// One page of a listing call. Transient, never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub issues: Vec<IssueSummary>,

    /// Total number of issues matching the query across all pages
    #[serde(default)]
    pub total: u64,

    /// Offset of the first issue in this page
    #[serde(rename = "startAt", default)]
    pub start_at: u64,
}

/// Minimal issue record returned by the listing call
#[derive(Debug, Clone, Deserialize)]
pub struct IssueSummary {
    pub key: String,

    #[serde(default)]
    pub fields: IssueFields,
}

/// Selected issue fields, all optional on the wire
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueFields {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub status: Option<NamedRef>,
    pub priority: Option<NamedRef>,
    pub assignee: Option<UserRef>,
    pub reporter: Option<UserRef>,
    pub created: Option<String>,
    pub updated: Option<String>,
    #[serde(rename = "resolutiondate")]
    pub resolution_date: Option<String>,
    pub labels: Option<Vec<String>>,
    pub components: Option<Vec<NamedRef>>,
    #[serde(rename = "fixVersions")]
    pub fix_versions: Option<Vec<NamedRef>>,
    #[serde(rename = "issuetype")]
    pub issue_type: Option<NamedRef>,
    pub project: Option<ProjectRef>,
}

/// Nested object carrying a display name (status, priority, component, ...)
#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub name: Option<String>,
}

/// Nested user object (assignee, reporter, comment author)
#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

/// Nested project object
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRef {
    pub key: Option<String>,
    pub name: Option<String>,
}

/// Response of the per-issue comment endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct CommentsResponse {
    #[serde(default)]
    pub comments: Vec<RawComment>,
}

/// A comment as returned on the wire
#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    pub author: Option<UserRef>,
    pub body: Option<String>,
    pub created: Option<String>,
}

impl RawComment {
    /// Flattens the wire comment into the normalized form
    pub fn normalize(self) -> Comment {
        Comment {
            author: self
                .author
                .and_then(|a| a.display_name)
                .unwrap_or_default(),
            body: self.body.unwrap_or_default(),
            created: self.created.unwrap_or_default(),
        }
    }
}

/// A normalized comment: author, body, creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub author: String,
    pub body: String,
    pub created: String,
}

/// An issue summary normalized and augmented with its comments
///
/// This is the record handed to the output sink. Nested names are extracted
/// (`status.name`, `assignee.displayName`, ...) and missing values become
/// empty strings, so downstream consumers never see nulls.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedIssue {
    pub key: String,
    pub summary: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub assignee: String,
    pub reporter: String,
    pub created: String,
    pub updated: String,
    pub resolution_date: String,
    pub labels: Vec<String>,
    pub components: Vec<String>,
    pub fix_versions: Vec<String>,
    pub issue_type: String,
    pub project_key: String,
    pub project_name: String,
    pub comments: Vec<Comment>,
}

impl EnrichedIssue {
    /// Builds an enriched issue from a listing summary and its fetched comments
    pub fn from_summary(summary: IssueSummary, comments: Vec<Comment>) -> Self {
        let fields = summary.fields;

        let named = |r: Option<NamedRef>| r.and_then(|n| n.name).unwrap_or_default();
        let user = |r: Option<UserRef>| r.and_then(|u| u.display_name).unwrap_or_default();
        let names = |rs: Option<Vec<NamedRef>>| {
            rs.unwrap_or_default()
                .into_iter()
                .map(|n| n.name.unwrap_or_default())
                .collect()
        };

        let (project_key, project_name) = match fields.project {
            Some(p) => (p.key.unwrap_or_default(), p.name.unwrap_or_default()),
            None => (String::new(), String::new()),
        };

        Self {
            key: summary.key,
            summary: fields.summary.unwrap_or_default(),
            description: fields.description.unwrap_or_default(),
            status: named(fields.status),
            priority: named(fields.priority),
            assignee: user(fields.assignee),
            reporter: user(fields.reporter),
            created: fields.created.unwrap_or_default(),
            updated: fields.updated.unwrap_or_default(),
            resolution_date: fields.resolution_date.unwrap_or_default(),
            labels: fields.labels.unwrap_or_default(),
            components: names(fields.components),
            fix_versions: names(fields.fix_versions),
            issue_type: named(fields.issue_type),
            project_key,
            project_name,
            comments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_page() {
        let json = r#"{
            "startAt": 100,
            "maxResults": 100,
            "total": 250,
            "issues": [
                {
                    "key": "SPARK-1234",
                    "fields": {
                        "summary": "Executor OOM under shuffle pressure",
                        "description": "Details here",
                        "status": {"name": "Resolved"},
                        "priority": {"name": "Major"},
                        "assignee": {"displayName": "Ada Lovelace"},
                        "reporter": {"displayName": "Grace Hopper"},
                        "created": "2020-01-01T00:00:00.000+0000",
                        "updated": "2020-02-01T00:00:00.000+0000",
                        "resolutiondate": "2020-02-01T00:00:00.000+0000",
                        "labels": ["shuffle", "memory"],
                        "components": [{"name": "Core"}, {"name": "Shuffle"}],
                        "fixVersions": [{"name": "3.0.0"}],
                        "issuetype": {"name": "Bug"},
                        "project": {"key": "SPARK", "name": "Spark"}
                    }
                }
            ]
        }"#;

        let page: Page = serde_json::from_str(json).unwrap();
        assert_eq!(page.start_at, 100);
        assert_eq!(page.total, 250);
        assert_eq!(page.issues.len(), 1);

        let enriched = EnrichedIssue::from_summary(page.issues[0].clone(), vec![]);
        assert_eq!(enriched.key, "SPARK-1234");
        assert_eq!(enriched.status, "Resolved");
        assert_eq!(enriched.priority, "Major");
        assert_eq!(enriched.assignee, "Ada Lovelace");
        assert_eq!(enriched.components, vec!["Core", "Shuffle"]);
        assert_eq!(enriched.fix_versions, vec!["3.0.0"]);
        assert_eq!(enriched.project_key, "SPARK");
    }

    #[test]
    fn test_deserialize_sparse_issue() {
        // Unassigned issues carry explicit nulls; everything defaults to empty
        let json = r#"{
            "key": "KAFKA-1",
            "fields": {
                "summary": "First issue",
                "description": null,
                "status": null,
                "assignee": null,
                "labels": null,
                "components": null
            }
        }"#;

        let summary: IssueSummary = serde_json::from_str(json).unwrap();
        let enriched = EnrichedIssue::from_summary(summary, vec![]);

        assert_eq!(enriched.key, "KAFKA-1");
        assert_eq!(enriched.summary, "First issue");
        assert_eq!(enriched.description, "");
        assert_eq!(enriched.status, "");
        assert_eq!(enriched.assignee, "");
        assert!(enriched.labels.is_empty());
        assert!(enriched.components.is_empty());
        assert!(enriched.comments.is_empty());
    }

    #[test]
    fn test_deserialize_issue_without_fields() {
        let json = r#"{"key": "HADOOP-42"}"#;
        let summary: IssueSummary = serde_json::from_str(json).unwrap();
        let enriched = EnrichedIssue::from_summary(summary, vec![]);
        assert_eq!(enriched.key, "HADOOP-42");
        assert_eq!(enriched.summary, "");
    }

    #[test]
    fn test_comment_normalization() {
        let json = r#"{
            "comments": [
                {"author": {"displayName": "Reviewer"}, "body": "LGTM", "created": "2020-01-02T00:00:00.000+0000"},
                {"author": null, "body": null, "created": null}
            ]
        }"#;

        let response: CommentsResponse = serde_json::from_str(json).unwrap();
        let comments: Vec<Comment> = response
            .comments
            .into_iter()
            .map(RawComment::normalize)
            .collect();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].author, "Reviewer");
        assert_eq!(comments[0].body, "LGTM");
        assert_eq!(comments[1].author, "");
        assert_eq!(comments[1].body, "");
    }

    #[test]
    fn test_empty_page_deserializes() {
        let page: Page = serde_json::from_str(r#"{"issues": [], "total": 0, "startAt": 0}"#).unwrap();
        assert!(page.issues.is_empty());
        assert_eq!(page.total, 0);
    }
}
