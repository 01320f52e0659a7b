//! One end-to-end run: enumerate, aggregate, prompt, invoke, report.

use thiserror::Error;

use crate::agent::{AgentError, AgentRequest, AgentSession};
use crate::aggregate::ContextAggregator;
use crate::domain::Config;
use crate::filter::IgnoreRuleSet;
use crate::prompt::build_prompt_from;
use crate::render::format_report;
use crate::session::{derive_session_id, EventContext, EventKind, SessionIdentity};
use crate::snapshot::SnapshotSource;

/// Fatal failures. Each aborts the run with a single message.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("{0}")]
    Configuration(String),
    #[error("failed to enumerate repository files: {0:#}")]
    Enumeration(anyhow::Error),
    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Validated inputs for a run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub event: EventKind,
    pub instruction: String,
    pub agent_id: String,
    pub agent_alias_id: String,
    pub session: SessionIdentity,
    pub max_file_bytes: u64,
    pub max_concurrent_fetches: usize,
    pub debug: bool,
}

impl RunSettings {
    pub fn from_config(
        config: &Config,
        event: EventKind,
        context: &EventContext,
    ) -> Result<Self, RunError> {
        let instruction = required(config.instruction.as_deref(), "instruction")?;
        let agent_id = required(config.agent_id.as_deref(), "agent_id")?;
        let agent_alias_id = required(config.agent_alias_id.as_deref(), "agent_alias_id")?;
        let session_id = derive_session_id(event, context).map_err(RunError::Configuration)?;
        let memory_id = config
            .memory_id
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        Ok(Self {
            event,
            instruction,
            agent_id,
            agent_alias_id,
            session: SessionIdentity { session_id, memory_id },
            max_file_bytes: config.max_file_bytes,
            max_concurrent_fetches: config.max_concurrent_fetches,
            debug: config.debug,
        })
    }
}

fn required(value: Option<&str>, name: &str) -> Result<String, RunError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Ok(v.to_string()),
        None => Err(RunError::Configuration(format!("Missing required input: {name}"))),
    }
}

/// The finished report and the numbers behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisReport {
    pub markdown: String,
    pub files_analyzed: usize,
    pub diffs_analyzed: usize,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Report(AnalysisReport),
    /// Nothing survived filtering; the agent was not called.
    NothingToAnalyze,
}

/// Wires the collaborators for a run. Both are injected so tests can stub them.
pub struct Pipeline<'a> {
    source: &'a dyn SnapshotSource,
    agent: &'a dyn AgentSession,
}

impl<'a> Pipeline<'a> {
    pub fn new(source: &'a dyn SnapshotSource, agent: &'a dyn AgentSession) -> Self {
        Self { source, agent }
    }

    pub async fn run(
        &self,
        settings: &RunSettings,
        rules: &IgnoreRuleSet,
    ) -> Result<RunOutcome, RunError> {
        if settings.debug {
            tracing::info!("Ignore patterns: {:?}", rules.patterns());
        }

        let files = self.source.list_files().await.map_err(RunError::Enumeration)?;
        tracing::info!("Enumerated {} files", files.len());

        let context = ContextAggregator::new(self.source)
            .max_file_bytes(settings.max_file_bytes)
            .concurrency(settings.max_concurrent_fetches)
            .aggregate(&files, &rules.compile())
            .await;

        if context.is_empty() {
            return Ok(RunOutcome::NothingToAnalyze);
        }

        let prompt = build_prompt_from(&context, &settings.instruction);
        if settings.debug {
            tracing::info!("Prompt:\n{}", prompt);
        }

        let request = AgentRequest {
            agent_id: settings.agent_id.clone(),
            agent_alias_id: settings.agent_alias_id.clone(),
            session_id: settings.session.session_id.clone(),
            memory_id: settings.session.memory_id.clone(),
            input_text: prompt,
        };
        let response = self.agent.invoke(&request).await?;

        let files_analyzed = context.status_entries.len();
        let diffs_analyzed = context.content_blocks.len();
        let markdown = format_report(
            &response,
            settings.event.label(),
            files_analyzed,
            diffs_analyzed,
            &context.records,
        );

        Ok(RunOutcome::Report(AnalysisReport {
            markdown,
            files_analyzed,
            diffs_analyzed,
            session_id: request.session_id,
        }))
    }
}
