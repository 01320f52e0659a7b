//! Prompt command implementation

use anyhow::Result;
use clap::Args;

use super::common::{open_source, prepare, CommonArgs};
use super::signal;
use crate::aggregate::ContextAggregator;
use crate::pipeline::RunError;
use crate::prompt::build_prompt_from;

#[derive(Args)]
pub struct PromptArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn run(args: PromptArgs) -> Result<()> {
    let prepared = prepare(&args.common, args.common.overrides())?;
    let instruction = prepared
        .config
        .instruction
        .as_deref()
        .map(str::trim)
        .filter(|i| !i.is_empty())
        .ok_or_else(|| RunError::Configuration("Missing required input: instruction".to_string()))?
        .to_string();

    let source = open_source(&args.common, &prepared).await?;
    let files = source.list_files().await.map_err(RunError::Enumeration)?;
    let context = ContextAggregator::new(source.as_ref())
        .max_file_bytes(prepared.config.max_file_bytes)
        .concurrency(prepared.config.max_concurrent_fetches)
        .aggregate(&files, &prepared.rules.compile())
        .await;

    if context.is_empty() {
        signal::warning("No files or diffs to analyze after applying ignore rules");
        return Ok(());
    }

    println!("{}", build_prompt_from(&context, &instruction));
    Ok(())
}
