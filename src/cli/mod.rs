//! Command-line interface for repo-insight
//!
//! Provides `run` (full analysis) and `prompt` (render the prompt only). Every
//! flag also reads the matching GitHub Actions environment variable.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod common;
mod prompt;
mod run;
pub mod signal;

/// Assemble repository snapshots into agent prompts and render analysis reports
#[derive(Parser)]
#[command(name = "repo-insight")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a repository snapshot with the agent and print the report
    Run(Box<run::RunArgs>),

    /// Print the prompt that `run` would send, without calling the agent
    Prompt(Box<prompt::PromptArgs>),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(cli.verbose, rust_log.as_deref());
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let runtime = tokio::runtime::Runtime::new()?;
    match cli.command {
        Commands::Run(args) => runtime.block_on(run::run(*args)),
        Commands::Prompt(args) => runtime.block_on(prompt::run(*args)),
    }
}

/// `--verbose` forces DEBUG. Otherwise a usable RUST_LOG wins as-is, and without one
/// our own progress lines (and --debug traces) log at INFO over a WARN baseline.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    rust_log
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn,repo_insight=info"))
}
