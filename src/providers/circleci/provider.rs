use log::{debug, info, warn};

use crate::auth::Token;
use crate::config::ProjectTarget;
use crate::error::Result;
use crate::metrics::{CollectionStats, DeploymentRow, Projected, SkipReason};
use crate::output::RowSink;
use crate::pagination::{OpaqueTokenCursor, Paginator};
use crate::window::TimeWindow;

use super::client::CircleCiClient;
use super::types::BuildRecord;

/// Provider for the deployment frequency report.
pub struct CircleCiProvider {
    client: CircleCiClient,
}

impl CircleCiProvider {
    pub fn new(base_url: &str, token: Token) -> Result<Self> {
        Ok(Self {
            client: CircleCiClient::new(base_url, token)?,
        })
    }

    /// Writes one row per webhook-triggered pipeline of `project`.
    ///
    /// Pages are followed while the response carries a `next_page_token`.
    /// Counts are not aggregated per day; that is left to whoever reads the
    /// CSV.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails, a pipeline is missing an
    /// expected field, or the sink cannot be written.
    pub async fn collect_deployments(
        &self,
        project: &ProjectTarget,
        window: &TimeWindow,
        sink: &mut impl RowSink<DeploymentRow>,
    ) -> Result<CollectionStats> {
        info!(
            "Collecting deployments for {} ({}) from {} to {}",
            project.slug, project.branch, window.start, window.end
        );

        let mut stats = CollectionStats::new(&project.slug);
        let mut pages = Paginator::<OpaqueTokenCursor>::new();

        while let Some(cursor) = pages.next_cursor() {
            let page = self.client.list_pipelines(project, window, &cursor).await?;
            pages.advance(cursor, &page);

            for build in page.items {
                stats.items += 1;
                match project_build(project, build) {
                    Projected::Row(row) => {
                        sink.emit(row)?;
                        stats.rows += 1;
                    }
                    Projected::Skipped(reason) => stats.record_skip(reason),
                }
            }
        }

        stats.pages = pages.pages_fetched();

        if stats.rows == 0 {
            warn!("No deployments found for project: {}", project.slug);
        }
        info!(
            "{}: {} deployments out of {} pipelines",
            project.slug, stats.rows, stats.items
        );

        Ok(stats)
    }
}

fn project_build(project: &ProjectTarget, build: BuildRecord) -> Projected<DeploymentRow> {
    if build.is_deploy() {
        Projected::Row(DeploymentRow::new(build.created_at, &project.slug))
    } else {
        debug!(
            "{}: ignoring {} pipeline from {}",
            project.slug, build.trigger_type, build.created_at
        );
        Projected::Skipped(SkipReason::NotWebhook)
    }
}
