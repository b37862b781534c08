use log::{debug, info, warn};

use crate::auth::Token;
use crate::error::Result;
use crate::metrics::{CollectionStats, CycleTimeRow, DedupSet, Projected, SkipReason};
use crate::output::RowSink;
use crate::pagination::{NumericPageCursor, Paginator};
use crate::window::TimeWindow;

use super::client::GitHubClient;
use super::types::RepositoryTarget;

/// Provider for the pull request cycle time report.
pub struct GitHubProvider {
    /// GitHub API client
    client: GitHubClient,
}

/// Issue search query for closed pull requests created inside the window.
///
/// Filtering is on creation date: a pull request opened before the window
/// but merged inside it is not found.
pub fn search_query(repo: &RepositoryTarget, window: &TimeWindow) -> String {
    format!(
        "repo:{repo} type:pr state:closed created:>={}",
        window.start.format("%Y-%m-%d")
    )
}

impl GitHubProvider {
    /// Create a new GitHub provider.
    ///
    /// # Arguments
    ///
    /// * `base_url` - GitHub API base URL
    /// * `token` - GitHub personal access token
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(base_url: &str, token: Token) -> Result<Self> {
        Ok(Self {
            client: GitHubClient::new(base_url, token)?,
        })
    }

    /// Writes one cycle time row per merged pull request of `repo`.
    ///
    /// Search pages are requested until one comes back empty; each page is
    /// projected before the next is fetched. Pull requests already written
    /// for this repository are skipped when a later page repeats them.
    ///
    /// # Errors
    ///
    /// Returns an error if any request fails, a response is missing an
    /// expected field, or the sink cannot be written. Rows emitted before
    /// the failure stay in the sink.
    pub async fn collect_cycle_times(
        &self,
        repo: &RepositoryTarget,
        window: &TimeWindow,
        sink: &mut impl RowSink<CycleTimeRow>,
    ) -> Result<CollectionStats> {
        info!("Collecting cycle times for {repo} since {}", window.start);

        let query = search_query(repo, window);
        let mut stats = CollectionStats::new(&repo.to_string());
        let mut seen = DedupSet::new();
        let mut pages = Paginator::<NumericPageCursor>::new();

        while let Some(cursor) = pages.next_cursor() {
            let page = self.client.search_pull_requests(&query, &cursor).await?;
            debug!(
                "{repo}: search page {} returned {} items",
                cursor.page(),
                page.items.len()
            );
            pages.advance(cursor, &page);

            for number in page.items {
                stats.items += 1;

                if seen.contains(number) {
                    debug!("{repo}#{number}: already processed");
                    stats.record_skip(SkipReason::Duplicate);
                    continue;
                }

                match self.project_pull_request(repo, number).await? {
                    Projected::Row(row) => {
                        sink.emit(row)?;
                        seen.mark(number);
                        stats.rows += 1;
                    }
                    Projected::Skipped(reason) => {
                        debug!("{repo}#{number}: skipped ({reason:?})");
                        stats.record_skip(reason);
                    }
                }
            }
        }

        stats.pages = pages.pages_fetched();

        if stats.rows == 0 {
            warn!("No merged pull requests found for {repo}");
        }
        info!(
            "{repo}: {} rows from {} pull requests across {} pages",
            stats.rows,
            seen.len(),
            stats.pages
        );

        Ok(stats)
    }

    /// Resolves one search hit into a row, or the reason it has none.
    ///
    /// Unmerged pull requests and pull requests without commits are skipped
    /// without being recorded as seen.
    async fn project_pull_request(
        &self,
        repo: &RepositoryTarget,
        number: u64,
    ) -> Result<Projected<CycleTimeRow>> {
        let Some(merged_at) = self.client.pull_request_merged_at(repo, number).await? else {
            return Ok(Projected::Skipped(SkipReason::NotMerged));
        };

        let commits = self.client.pull_request_commits(repo, number).await?;
        let Some(first_sha) = commits.first() else {
            return Ok(Projected::Skipped(SkipReason::NoCommits));
        };

        let first_commit = self.client.commit(repo, first_sha).await?;

        Ok(Projected::Row(CycleTimeRow::new(
            &repo.to_string(),
            number,
            &first_commit.message,
            first_commit.author_date,
            merged_at,
        )))
    }
}
