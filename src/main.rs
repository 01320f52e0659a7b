//! repo-insight: assemble repository snapshots into agent prompts and render
//! analysis reports.

use std::process::ExitCode;

fn main() -> ExitCode {
    match repo_insight::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            repo_insight::cli::signal::fatal(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
