use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{MetricsError, Result};

/// A repository in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryTarget {
    pub owner: String,
    pub name: String,
}

impl RepositoryTarget {
    pub fn parse(identifier: &str) -> Result<Self> {
        match identifier.split('/').collect::<Vec<_>>().as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: (*owner).to_string(),
                name: (*name).to_string(),
            }),
            _ => Err(MetricsError::InvalidArgument(format!(
                "Repository must be in format 'owner/repo', got '{identifier}'"
            ))),
        }
    }
}

impl fmt::Display for RepositoryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Response from `GET /search/issues`.
#[derive(Debug, Deserialize)]
pub(super) struct SearchIssuesResponse {
    pub items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchItem {
    pub number: Option<u64>,
}

impl SearchIssuesResponse {
    /// Pull request numbers in the order the search returned them.
    pub fn into_numbers(self) -> Result<Vec<u64>> {
        self.items
            .ok_or_else(|| MetricsError::missing_field("items", "search"))?
            .into_iter()
            .map(|item| {
                item.number
                    .ok_or_else(|| MetricsError::missing_field("items[].number", "search"))
            })
            .collect()
    }
}

/// Response from `GET /repos/{owner}/{repo}/pulls/{number}`.
///
/// Only the merge timestamp is read; `null` means the pull request was
/// closed without merging.
#[derive(Debug, Deserialize)]
pub(super) struct PullRequestResponse {
    pub merged_at: Option<DateTime<Utc>>,
}

/// Entry of `GET /repos/{owner}/{repo}/pulls/{number}/commits`.
#[derive(Debug, Deserialize)]
pub(super) struct CommitRef {
    pub sha: Option<String>,
}

/// Response from `GET /repos/{owner}/{repo}/commits/{sha}`.
#[derive(Debug, Deserialize)]
pub(super) struct CommitResponse {
    pub commit: Option<GitCommit>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GitCommit {
    pub author: Option<GitAuthor>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GitAuthor {
    pub date: Option<DateTime<Utc>>,
}

/// The parts of a commit the cycle time report needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub author_date: DateTime<Utc>,
    pub message: String,
}

impl CommitResponse {
    pub fn into_summary(self, context: &str) -> Result<CommitSummary> {
        let commit = self
            .commit
            .ok_or_else(|| MetricsError::missing_field("commit", context))?;

        let author_date = commit
            .author
            .and_then(|author| author.date)
            .ok_or_else(|| MetricsError::missing_field("commit.author.date", context))?;

        let message = commit
            .message
            .ok_or_else(|| MetricsError::missing_field("commit.message", context))?;

        Ok(CommitSummary {
            author_date,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_target_parse() {
        let repo = RepositoryTarget::parse("acme/api").unwrap();
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.name, "api");
        assert_eq!(repo.to_string(), "acme/api");
    }

    #[test]
    fn test_repository_target_invalid_path() {
        for identifier in ["invalid-path", "owner/repo/extra", "/repo", "owner/"] {
            let err = RepositoryTarget::parse(identifier).unwrap_err();
            assert!(err.to_string().contains("owner/repo"), "{identifier}");
        }
    }

    #[test]
    fn test_search_response_missing_items() {
        let response: SearchIssuesResponse =
            serde_json::from_str(r#"{"total_count": 0}"#).unwrap();
        let err = response.into_numbers().unwrap_err();
        assert!(matches!(err, MetricsError::MissingField { field: "items", .. }));
    }

    #[test]
    fn test_search_response_item_without_number() {
        let response: SearchIssuesResponse =
            serde_json::from_str(r#"{"items": [{"number": 1}, {"title": "x"}]}"#).unwrap();
        assert!(response.into_numbers().is_err());
    }

    #[test]
    fn test_commit_summary_requires_author_date() {
        let response: CommitResponse =
            serde_json::from_str(r#"{"commit": {"author": {"name": "a"}, "message": "m"}}"#)
                .unwrap();
        let err = response.into_summary("commit abc").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing field `commit.author.date` in commit abc response"
        );
    }

    #[test]
    fn test_commit_summary() {
        let response: CommitResponse = serde_json::from_str(
            r#"{"commit": {"author": {"date": "2024-01-01T23:00:00Z"}, "message": "Fix"}}"#,
        )
        .unwrap();
        let summary = response.into_summary("commit abc").unwrap();
        assert_eq!(summary.message, "Fix");
        assert_eq!(summary.author_date.to_rfc3339(), "2024-01-01T23:00:00+00:00");
    }
}
