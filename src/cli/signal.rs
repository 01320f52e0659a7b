//! Host signalling: fatal errors and non-fatal early-return warnings.
//!
//! Under GitHub Actions the messages are also emitted as workflow commands so
//! they surface as annotations on the run.

fn in_github_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").map(|v| v == "true").unwrap_or(false)
}

/// Escape a message for a `::command::` line.
pub fn escape_workflow_message(message: &str) -> String {
    message.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

pub fn fatal(message: &str) {
    eprintln!("error: {message}");
    if in_github_actions() {
        println!("::error::{}", escape_workflow_message(message));
    }
}

pub fn warning(message: &str) {
    eprintln!("warning: {message}");
    if in_github_actions() {
        println!("::warning::{}", escape_workflow_message(message));
    }
}
