//! Arguments and setup shared by `run` and `prompt`.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::config::loader::read_ignore_file;
use crate::config::{load_config, merge_cli_with_config, CliOverrides};
use crate::domain::Config;
use crate::filter::IgnoreRuleSet;
use crate::pipeline::RunError;
use crate::session::{EventContext, EventKind};
use crate::snapshot::{GitHubSnapshot, GitSnapshot, SnapshotSource};

#[derive(Args)]
pub struct CommonArgs {
    /// Instruction appended to the prompt
    #[arg(long, value_name = "TEXT", env = "INPUT_INSTRUCTION")]
    pub instruction: Option<String>,

    /// Exclude paths matching these globs (comma-separated)
    #[arg(short = 'e', long, value_name = "GLOBS", env = "INPUT_IGNORE_PATTERNS")]
    pub ignore_patterns: Option<String>,

    /// Ignore file with one glob per line, relative to the workspace
    #[arg(long, value_name = "FILE", env = "INPUT_IGNORE_FILE")]
    pub ignore_file: Option<PathBuf>,

    /// GitHub repository to analyze (owner/repo)
    #[arg(short = 'r', long = "repo", value_name = "OWNER/REPO", env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Read a local git repository instead of the GitHub API (takes precedence over --repo)
    #[arg(long, value_name = "PATH")]
    pub local: Option<PathBuf>,

    /// Git ref (branch/tag/SHA); ignored for scheduled runs
    #[arg(long = "ref", value_name = "REF", env = "GITHUB_REF_NAME")]
    pub ref_: Option<String>,

    /// Triggering event name (workflow_dispatch, schedule); omit for ad-hoc runs
    #[arg(long, value_name = "EVENT", env = "GITHUB_EVENT_NAME")]
    pub event: Option<String>,

    /// Unique id of the triggering run
    #[arg(long, value_name = "ID", env = "GITHUB_RUN_ID")]
    pub run_id: Option<String>,

    /// Directory holding the config and ignore files
    #[arg(long, value_name = "DIR", env = "GITHUB_WORKSPACE", default_value = ".")]
    pub workspace: PathBuf,

    /// Path to config file (repo-insight.toml or .repo-insight.yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// GitHub REST API base URL
    #[arg(long, value_name = "URL", env = "GITHUB_API_URL")]
    pub github_api_url: Option<String>,

    /// Token for the GitHub API
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Files larger than this (bytes) are listed without content
    #[arg(long, value_name = "BYTES", env = "INPUT_MAX_FILE_BYTES")]
    pub max_file_bytes: Option<u64>,

    /// Maximum number of concurrent file fetches
    #[arg(long, value_name = "N", env = "INPUT_MAX_CONCURRENT_FETCHES")]
    pub max_concurrent_fetches: Option<usize>,

    /// Log the pattern list and the full prompt
    #[arg(long, env = "INPUT_DEBUG")]
    pub debug: bool,
}

impl CommonArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            instruction: self.instruction.clone(),
            ignore_patterns: self.ignore_patterns.clone(),
            ignore_file: self.ignore_file.clone(),
            repository: self.repository.clone(),
            ref_: self.ref_.clone(),
            github_api_url: self.github_api_url.clone(),
            max_file_bytes: self.max_file_bytes,
            max_concurrent_fetches: self.max_concurrent_fetches,
            debug: self.debug,
            ..CliOverrides::default()
        }
    }
}

/// Everything resolved before the first network call.
pub struct Prepared {
    pub config: Config,
    pub event: EventKind,
    pub event_context: EventContext,
    pub rules: IgnoreRuleSet,
}

pub fn prepare(common: &CommonArgs, overrides: CliOverrides) -> Result<Prepared> {
    let workspace = common.workspace.as_path();
    let file_config = load_config(workspace, common.config.as_deref())?;
    let config = merge_cli_with_config(file_config, overrides);

    let event =
        EventKind::from_event_name(common.event.as_deref()).map_err(RunError::Configuration)?;
    let event_context = EventContext::new(common.run_id.clone());

    let ignore_text = read_ignore_file(workspace, &config.ignore_file)?;
    let rules = IgnoreRuleSet::merge(&config.ignore_patterns, ignore_text.as_deref());
    if config.debug {
        tracing::info!("Event: {}", event);
        tracing::info!("Caller patterns: {:?}", config.ignore_patterns);
    }

    Ok(Prepared { config, event, event_context, rules })
}

/// Pick the snapshot strategy: a local repository when `--local` is given,
/// otherwise the GitHub API.
pub async fn open_source(
    common: &CommonArgs,
    prepared: &Prepared,
) -> Result<Box<dyn SnapshotSource>> {
    let selector = prepared.event.snapshot_ref(prepared.config.ref_.as_deref());

    if let Some(local) = &common.local {
        let snapshot = GitSnapshot::open(local, selector)?;
        tracing::info!("Reading local repository {} at {}", local.display(), snapshot.reference());
        return Ok(Box::new(snapshot));
    }

    let repository = prepared.config.repository.as_deref().ok_or_else(|| {
        RunError::Configuration(
            "Missing required input: repository (set --repo or GITHUB_REPOSITORY)".to_string(),
        )
    })?;
    let snapshot = GitHubSnapshot::open(
        &prepared.config.github_api_url,
        repository,
        common.github_token.as_deref(),
        selector,
    )
    .await
    .with_context(|| format!("Failed to open repository {repository}"))?
    .max_file_bytes(prepared.config.max_file_bytes);
    tracing::info!("Reading {} at {}", repository, snapshot.reference());
    Ok(Box::new(snapshot))
}
