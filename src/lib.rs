//! repo-insight: turn a repository snapshot into an agent analysis report
//!
//! A run enumerates a repository's files, drops those matching the merged ignore
//! rules, fetches the rest concurrently, renders a prompt, hands it to an agent
//! session and formats the response as a markdown report.

pub mod agent;
pub mod aggregate;
pub mod cli;
pub mod config;
pub mod domain;
pub mod filter;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod session;
pub mod snapshot;
pub mod utils;
