//! Run command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::common::{open_source, prepare, CommonArgs};
use super::signal;
use crate::agent::HttpAgentClient;
use crate::pipeline::{Pipeline, RunError, RunOutcome, RunSettings};
use crate::render::{write_report, ReportSinks};

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Agent identifier
    #[arg(long, value_name = "ID", env = "INPUT_AGENT_ID")]
    pub agent_id: Option<String>,

    /// Agent alias identifier
    #[arg(long, value_name = "ID", env = "INPUT_AGENT_ALIAS_ID")]
    pub agent_alias_id: Option<String>,

    /// Base URL of the agent gateway
    #[arg(long, value_name = "URL", env = "INPUT_AGENT_ENDPOINT")]
    pub agent_endpoint: Option<String>,

    /// API key for the agent gateway
    #[arg(long, value_name = "KEY", env = "AGENT_API_KEY", hide_env_values = true)]
    pub agent_api_key: Option<String>,

    /// Memory id forwarded to the agent to recall state across runs
    #[arg(long, value_name = "ID", env = "INPUT_MEMORY_ID")]
    pub memory_id: Option<String>,

    /// Also write the report to this file
    #[arg(short = 'o', long, value_name = "FILE", env = "INPUT_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Append the report to this file (GitHub Actions job summary)
    #[arg(long, value_name = "FILE", env = "GITHUB_STEP_SUMMARY")]
    pub step_summary: Option<PathBuf>,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let mut overrides = args.common.overrides();
    overrides.agent_id = args.agent_id.clone();
    overrides.agent_alias_id = args.agent_alias_id.clone();
    overrides.agent_endpoint = args.agent_endpoint.clone();
    overrides.memory_id = args.memory_id.clone();
    overrides.output = args.output.clone();

    let prepared = prepare(&args.common, overrides)?;
    let settings =
        RunSettings::from_config(&prepared.config, prepared.event, &prepared.event_context)?;
    let endpoint = prepared
        .config
        .agent_endpoint
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| {
            RunError::Configuration("Missing required input: agent_endpoint".to_string())
        })?;
    let agent = HttpAgentClient::new(endpoint, args.agent_api_key.as_deref())?;
    tracing::info!("Session {} for {} event", settings.session.session_id, settings.event);

    let source = open_source(&args.common, &prepared).await?;
    let outcome = Pipeline::new(source.as_ref(), &agent).run(&settings, &prepared.rules).await?;

    match outcome {
        RunOutcome::NothingToAnalyze => {
            signal::warning("No files or diffs to analyze after applying ignore rules");
        }
        RunOutcome::Report(report) => {
            tracing::info!(
                "Agent analyzed {} files ({} with content)",
                report.files_analyzed,
                report.diffs_analyzed
            );
            let sinks = ReportSinks {
                output: prepared.config.output.clone(),
                step_summary: args.step_summary.clone(),
            };
            write_report(&report.markdown, &sinks)?;
        }
    }
    Ok(())
}
