use chrono::{DateTime, Utc};

use crate::auth::Token;
use crate::error::{MetricsError, Result};
use crate::pagination::{NumericPageCursor, Page, PageCursor};
use crate::providers::http::{ApiClient, Credential};

use super::types::{
    CommitRef, CommitResponse, CommitSummary, PullRequestResponse, RepositoryTarget,
    SearchIssuesResponse,
};

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub REST API client for the endpoints the cycle time report needs.
pub struct GitHubClient {
    api: ApiClient,
}

impl GitHubClient {
    /// Create a new GitHub API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - GitHub API base URL (e.g., "https://api.github.com")
    /// * `token` - GitHub personal access token, sent as a bearer token
    pub fn new(base_url: &str, token: Token) -> Result<Self> {
        let api = ApiClient::new(
            base_url,
            "application/vnd.github+json",
            Credential::Bearer(token),
        )?;

        Ok(Self { api })
    }

    /// Fetch one page of issue search results, returning pull request numbers.
    pub async fn search_pull_requests(
        &self,
        query: &str,
        cursor: &NumericPageCursor,
    ) -> Result<Page<u64>> {
        let mut params = vec![("q", query.to_string())];
        params.extend(cursor.query());

        let response: SearchIssuesResponse = self
            .api
            .get_json("search/issues", &params, "search")
            .await?;

        Ok(Page::new(response.into_numbers()?, None))
    }

    /// Fetch the merge timestamp of a pull request; `None` when not merged.
    pub async fn pull_request_merged_at(
        &self,
        repo: &RepositoryTarget,
        number: u64,
    ) -> Result<Option<DateTime<Utc>>> {
        let path = format!("repos/{}/{}/pulls/{number}", repo.owner, repo.name);
        let response: PullRequestResponse = self
            .api
            .get_json(&path, &[], &format!("pull request #{number}"))
            .await?;

        Ok(response.merged_at)
    }

    /// Fetch the commit SHAs of a pull request, oldest first.
    ///
    /// Only the first page is requested; the report only looks at the first
    /// commit.
    pub async fn pull_request_commits(
        &self,
        repo: &RepositoryTarget,
        number: u64,
    ) -> Result<Vec<String>> {
        let path = format!("repos/{}/{}/pulls/{number}/commits", repo.owner, repo.name);
        let context = format!("pull request #{number} commits");
        let commits: Vec<CommitRef> = self.api.get_json(&path, &[], &context).await?;

        commits
            .into_iter()
            .map(|commit| {
                commit
                    .sha
                    .ok_or_else(|| MetricsError::missing_field("sha", context.as_str()))
            })
            .collect()
    }

    /// Fetch a single commit's author date and message.
    pub async fn commit(&self, repo: &RepositoryTarget, sha: &str) -> Result<CommitSummary> {
        let path = format!("repos/{}/{}/commits/{sha}", repo.owner, repo.name);
        let context = format!("commit {sha}");
        let response: CommitResponse = self.api.get_json(&path, &[], &context).await?;

        response.into_summary(&context)
    }
}
