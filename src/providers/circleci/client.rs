use log::debug;

use crate::auth::Token;
use crate::config::ProjectTarget;
use crate::error::Result;
use crate::pagination::{OpaqueTokenCursor, Page, PageCursor};
use crate::providers::http::{ApiClient, Credential};
use crate::window::TimeWindow;

use super::types::{BuildRecord, PipelineListResponse};

pub const DEFAULT_CIRCLECI_API_URL: &str = "https://circleci.com/api/v2";

/// CircleCI v2 API client.
pub struct CircleCiClient {
    api: ApiClient,
}

impl CircleCiClient {
    /// Create a new CircleCI API client.
    ///
    /// The token is sent in the `Circle-Token` header.
    pub fn new(base_url: &str, token: Token) -> Result<Self> {
        let api = ApiClient::new(
            base_url,
            "application/json",
            Credential::Header("Circle-Token", token),
        )?;

        Ok(Self { api })
    }

    /// Fetch one page of pipelines for `project` on its branch within `window`.
    pub async fn list_pipelines(
        &self,
        project: &ProjectTarget,
        window: &TimeWindow,
        cursor: &OpaqueTokenCursor,
    ) -> Result<Page<BuildRecord>> {
        let path = format!("project/{}/pipeline", project.slug);
        let mut params = vec![
            ("branch", project.branch.clone()),
            ("start_date", window.start.format("%Y-%m-%d").to_string()),
            ("end_date", window.end.format("%Y-%m-%d").to_string()),
        ];
        params.extend(cursor.query());

        debug!(
            "{}: requesting pipelines (page token: {})",
            project.slug,
            cursor.token().unwrap_or("none")
        );

        let context = format!("pipelines for {}", project.slug);
        let response: PipelineListResponse = self.api.get_json(&path, &params, &context).await?;

        response.into_page(&context)
    }
}
