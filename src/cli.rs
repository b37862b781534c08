use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::auth::Token;
use crate::config::{Config, DEFAULT_REPOSITORIES};
use crate::error::MetricsError;
use crate::metrics::{CycleTimeRow, DeploymentRow};
use crate::output::{print_summary, CsvWriter, Report, TargetProgress};
use crate::providers::circleci::{CircleCiProvider, DEFAULT_CIRCLECI_API_URL};
use crate::providers::github::{GitHubProvider, RepositoryTarget, DEFAULT_GITHUB_API_URL};
use crate::window::{parse_months_ago, TimeWindow};

#[derive(Parser)]
#[command(name = "engmetrics")]
#[command(
    author,
    version,
    about = "Export pull request cycle time and deployment frequency as CSV",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Write the CSV report to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Days from first commit to merge for each merged pull request
    CycleTime {
        /// How many months back the report starts
        #[arg(allow_negative_numbers = true)]
        months_ago: String,

        #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Repository to report on, as owner/name (repeatable)
        #[arg(short, long = "repo")]
        repos: Vec<String>,

        #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_GITHUB_API_URL)]
        api_url: String,

        /// Print per-repository statistics to stderr when done
        #[arg(short, long, default_value_t = false)]
        summary: bool,
    },
    /// One row per push-triggered pipeline on each configured project branch
    DeploymentFrequency {
        /// YAML, TOML or JSON file listing CircleCI projects
        config_file: PathBuf,

        /// How many months back the report starts
        #[arg(allow_negative_numbers = true)]
        months_ago: String,

        #[arg(short, long, env = "CIRCLECI_TOKEN", hide_env_values = true)]
        token: Option<String>,

        #[arg(long, env = "CIRCLECI_API_URL", default_value = DEFAULT_CIRCLECI_API_URL)]
        api_url: String,

        /// Print per-project statistics to stderr when done
        #[arg(short, long, default_value_t = false)]
        summary: bool,
    },
}

impl Cli {
    /// Opens the report destination: the `--output` file, or stdout.
    fn open_output(&self) -> Result<CsvWriter<Box<dyn Write>>> {
        let output: Box<dyn Write> = match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create output file {}", path.display()))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(BufWriter::new(io::stdout().lock())),
        };

        Ok(CsvWriter::new(output))
    }

    fn report_written(&self) {
        if let Some(output_path) = &self.output {
            info!("Report written to: {}", output_path.display());
        }
    }

    async fn execute_cycle_time(
        &self,
        months_ago: &str,
        token: Option<&str>,
        repos: &[String],
        api_url: &str,
        summary: bool,
    ) -> Result<()> {
        let window = TimeWindow::ending_today(parse_months_ago(months_ago)?)?;
        let token = require_token(token, "GITHUB_TOKEN")?;

        let identifiers: Vec<&str> = if repos.is_empty() {
            DEFAULT_REPOSITORIES.to_vec()
        } else {
            repos.iter().map(String::as_str).collect()
        };
        let targets = identifiers
            .into_iter()
            .map(RepositoryTarget::parse)
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Collecting cycle times for {} repositories from {} to {}",
            targets.len(),
            window.start,
            window.end
        );

        let provider = GitHubProvider::new(api_url, token)?;
        let mut writer = self.open_output()?;
        writer.write_header::<CycleTimeRow>()?;

        let mut stats = Vec::with_capacity(targets.len());
        for (index, repo) in targets.iter().enumerate() {
            let progress = TargetProgress::start(index + 1, targets.len(), &repo.to_string());

            match provider.collect_cycle_times(repo, &window, &mut writer).await {
                Ok(repo_stats) => {
                    progress.finish(&repo_stats);
                    stats.push(repo_stats);
                }
                Err(e) => {
                    progress.abandon();
                    writer.flush()?;
                    return Err(e)
                        .with_context(|| format!("Failed to collect cycle times for {repo}"));
                }
            }
        }

        writer.flush()?;
        self.report_written();

        if summary {
            print_summary(Report::CycleTime, &stats);
        }

        Ok(())
    }

    async fn execute_deployment_frequency(
        &self,
        config_file: &Path,
        months_ago: &str,
        token: Option<&str>,
        api_url: &str,
        summary: bool,
    ) -> Result<()> {
        let token = require_token(token, "CIRCLECI_TOKEN")?;
        let config = Config::load_from_path(config_file)?;
        let window = TimeWindow::ending_today(parse_months_ago(months_ago)?)?;

        info!(
            "Collecting deployments for {} projects from {} to {}",
            config.projects.len(),
            window.start,
            window.end
        );

        let provider = CircleCiProvider::new(api_url, token)?;
        let mut writer = self.open_output()?;
        writer.write_header::<DeploymentRow>()?;

        let mut stats = Vec::with_capacity(config.projects.len());
        for (index, project) in config.projects.iter().enumerate() {
            let progress = TargetProgress::start(index + 1, config.projects.len(), &project.slug);

            match provider.collect_deployments(project, &window, &mut writer).await {
                Ok(project_stats) => {
                    progress.finish(&project_stats);
                    stats.push(project_stats);
                }
                Err(e) => {
                    progress.abandon();
                    writer.flush()?;
                    return Err(e).with_context(|| {
                        format!("Failed to collect deployments for {}", project.slug)
                    });
                }
            }
        }

        writer.flush()?;
        self.report_written();

        if summary {
            print_summary(Report::DeploymentFrequency, &stats);
        }

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::CycleTime {
                months_ago,
                token,
                repos,
                api_url,
                summary,
            } => {
                self.execute_cycle_time(months_ago, token.as_deref(), repos, api_url, *summary)
                    .await
            }
            Commands::DeploymentFrequency {
                config_file,
                months_ago,
                token,
                api_url,
                summary,
            } => {
                self.execute_deployment_frequency(
                    config_file,
                    months_ago,
                    token.as_deref(),
                    api_url,
                    *summary,
                )
                .await
            }
        }
    }
}

/// An empty value counts as unset.
fn require_token(token: Option<&str>, variable: &'static str) -> Result<Token, MetricsError> {
    token
        .filter(|t| !t.trim().is_empty())
        .map(Token::from)
        .ok_or(MetricsError::MissingCredential(variable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_require_token() {
        assert_eq!(
            require_token(Some("abc"), "GITHUB_TOKEN").unwrap().as_str(),
            "abc"
        );
        let err = require_token(None, "GITHUB_TOKEN").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing credential: GITHUB_TOKEN environment variable not set"
        );
        assert!(require_token(Some("  "), "CIRCLECI_TOKEN").is_err());
    }

    #[test]
    fn test_cycle_time_repeatable_repo_flag() {
        let cli = Cli::try_parse_from([
            "engmetrics",
            "cycle-time",
            "3",
            "--token",
            "t",
            "--repo",
            "acme/api",
            "--repo",
            "acme/web",
        ])
        .unwrap();

        match cli.command {
            Commands::CycleTime {
                months_ago, repos, ..
            } => {
                assert_eq!(months_ago, "3");
                assert_eq!(repos, vec!["acme/api", "acme/web"]);
            }
            Commands::DeploymentFrequency { .. } => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_deployment_frequency_requires_config_and_months() {
        assert!(Cli::try_parse_from(["engmetrics", "deployment-frequency"]).is_err());
        assert!(
            Cli::try_parse_from(["engmetrics", "deployment-frequency", "projects.yml"]).is_err()
        );
    }

    #[test]
    fn test_global_output_after_subcommand() {
        let cli = Cli::try_parse_from([
            "engmetrics",
            "deployment-frequency",
            "projects.yml",
            "2",
            "--output",
            "deploys.csv",
        ])
        .unwrap();
        assert_eq!(cli.output, Some(PathBuf::from("deploys.csv")));
    }

    #[tokio::test]
    async fn test_missing_config_file_is_reported_before_months_ago() {
        let cli = Cli::try_parse_from([
            "engmetrics",
            "deployment-frequency",
            "/nonexistent/projects.yml",
            "zero",
            "--token",
            "t",
        ])
        .unwrap();

        let err = cli.execute().await.unwrap_err();
        assert!(err.to_string().contains("Configuration file does not exist"));
    }

    const MONTHS_AGO_ERROR: &str = "'months_ago' should be a positive integer";

    #[tokio::test]
    async fn test_invalid_months_ago_is_rejected() {
        for months_ago in ["0", "-1", "three"] {
            let cli =
                Cli::try_parse_from(["engmetrics", "cycle-time", months_ago, "--token", "t"])
                    .unwrap();

            let err = cli.execute().await.unwrap_err();
            assert!(err.to_string().contains(MONTHS_AGO_ERROR), "{months_ago}");
        }
    }

    #[test]
    fn test_negative_months_ago_is_parsed_as_a_value() {
        let cli = Cli::try_parse_from(["engmetrics", "cycle-time", "-1"]).unwrap();
        match cli.command {
            Commands::CycleTime { months_ago, .. } => assert_eq!(months_ago, "-1"),
            Commands::DeploymentFrequency { .. } => panic!("wrong subcommand"),
        }
    }

    #[tokio::test]
    async fn test_cycle_time_checks_months_ago_before_token() {
        let cli = Cli::try_parse_from(["engmetrics", "cycle-time", "0"]).unwrap();

        let err = cli.execute().await.unwrap_err();
        assert!(err.to_string().contains(MONTHS_AGO_ERROR));
    }

    #[tokio::test]
    async fn test_deployment_frequency_rejects_months_ago_before_any_request() {
        let mut server = mockito::Server::new_async().await;
        let pipelines = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let mut config = NamedTempFile::with_suffix(".yml").unwrap();
        writeln!(config, "projects:\n  - slug: gh/acme/api\n    branch: main").unwrap();
        let config_path = config.path().to_str().unwrap().to_string();

        for months_ago in ["0", "-1"] {
            let cli = Cli::try_parse_from([
                "engmetrics",
                "deployment-frequency",
                config_path.as_str(),
                months_ago,
                "--token",
                "t",
                "--api-url",
                server.url().as_str(),
            ])
            .unwrap();

            let err = cli.execute().await.unwrap_err();
            assert!(err.to_string().contains(MONTHS_AGO_ERROR), "{months_ago}");
        }

        pipelines.assert_async().await;
    }
}
