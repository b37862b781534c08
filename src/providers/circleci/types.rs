use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{MetricsError, Result};
use crate::pagination::Page;

/// Trigger type CircleCI reports for pipelines started by a VCS push.
pub const WEBHOOK_TRIGGER: &str = "webhook";

/// Response from `GET /project/{slug}/pipeline`.
#[derive(Debug, Deserialize)]
pub(super) struct PipelineListResponse {
    pub items: Option<Vec<PipelineItem>>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PipelineItem {
    pub created_at: Option<DateTime<Utc>>,
    pub trigger: Option<PipelineTrigger>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PipelineTrigger {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// A CircleCI pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecord {
    pub created_at: DateTime<Utc>,
    /// How the pipeline was started (e.g., "webhook", "api", "schedule")
    pub trigger_type: String,
}

impl BuildRecord {
    /// Whether the pipeline was started automatically by a push.
    pub fn is_deploy(&self) -> bool {
        self.trigger_type == WEBHOOK_TRIGGER
    }
}

impl PipelineListResponse {
    pub fn into_page(self, context: &str) -> Result<Page<BuildRecord>> {
        let items = self
            .items
            .ok_or_else(|| MetricsError::missing_field("items", context))?
            .into_iter()
            .map(|item| {
                let trigger_type = item
                    .trigger
                    .and_then(|trigger| trigger.kind)
                    .ok_or_else(|| MetricsError::missing_field("items[].trigger.type", context))?;
                let created_at = item
                    .created_at
                    .ok_or_else(|| MetricsError::missing_field("items[].created_at", context))?;

                Ok(BuildRecord {
                    created_at,
                    trigger_type,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(items, self.next_page_token))
    }
}
