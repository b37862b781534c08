use serde::Deserialize;
use std::path::Path;

use crate::error::{MetricsError, Result};

/// Repositories reported on by `cycle-time` when no `--repo` is given.
pub const DEFAULT_REPOSITORIES: &[&str] = &[
    "flatiron-labs/askbot",
    "flatiron-labs/canforce",
    "flatiron-labs/canvas-theme-files",
    "flatiron-labs/ci-tools-orb",
    "flatiron-labs/easely",
    "flatiron-labs/flatiron-graphql",
    "flatiron-labs/flatiron_auth",
    "flatiron-labs/healthcheck",
    "flatiron-labs/infra-gql-gateway",
    "flatiron-labs/ironboard",
    "flatiron-labs/ironbroker-v2",
    "flatiron-labs/ironlogger",
    "flatiron-labs/monorepo",
    "flatiron-labs/ops",
    "flatiron-labs/registrar",
    "flatiron-labs/service-catalog",
    "flatiron-labs/service-content",
    "flatiron-labs/service-documents",
    "flatiron-labs/service-educator",
    "flatiron-labs/service-identity",
    "flatiron-labs/service-milestones",
    "flatiron-labs/service-operations",
    "flatiron-labs/student-home",
    "flatiron-labs/service-student-progress",
];

/// Project list for the deployment frequency report.
///
/// ```yaml
/// projects:
///   - slug: gh/acme/api
///     branch: main
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub projects: Vec<ProjectTarget>,
}

/// A CircleCI project and the branch whose pipelines count as deploys.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectTarget {
    /// Project slug in `<vcs>/<org>/<repo>` form (e.g., "gh/acme/api")
    pub slug: String,
    pub branch: String,
}

impl Config {
    /// Load configuration from a specific file path.
    ///
    /// The format is picked from the extension (`yaml`/`yml`, `toml`,
    /// `json`); unknown extensions try YAML, then TOML, then JSON.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MetricsError::Config(format!(
                "Configuration file does not exist: {}",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            MetricsError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        let parsed: std::result::Result<Self, String> = match extension {
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| e.to_string()),
            "toml" => toml::from_str(&contents).map_err(|e| e.to_string()),
            "json" => serde_json::from_str(&contents).map_err(|e| e.to_string()),
            _ => serde_yaml::from_str(&contents)
                .or_else(|_| toml::from_str(&contents))
                .or_else(|_| serde_json::from_str(&contents))
                .map_err(|_| "not valid YAML, TOML or JSON".to_string()),
        };

        parsed.map_err(|e| {
            MetricsError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }
}
