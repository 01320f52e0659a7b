//! Merge CLI/environment overrides onto file configuration.

use crate::domain::{split_csv, Config};
use std::path::PathBuf;

/// Values supplied on the command line or through `INPUT_*` environment variables.
/// `None` means "not given"; the file or default value stays in place.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub instruction: Option<String>,
    pub ignore_patterns: Option<String>,
    pub ignore_file: Option<PathBuf>,
    pub agent_id: Option<String>,
    pub agent_alias_id: Option<String>,
    pub agent_endpoint: Option<String>,
    pub memory_id: Option<String>,
    pub repository: Option<String>,
    pub ref_: Option<String>,
    pub github_api_url: Option<String>,
    pub max_file_bytes: Option<u64>,
    pub max_concurrent_fetches: Option<usize>,
    pub output: Option<PathBuf>,
    pub debug: bool,
}

pub fn merge_cli_with_config(mut config: Config, cli: CliOverrides) -> Config {
    fn set<T>(slot: &mut Option<T>, value: Option<T>) {
        if value.is_some() {
            *slot = value;
        }
    }

    set(&mut config.instruction, cli.instruction);
    set(&mut config.agent_id, cli.agent_id);
    set(&mut config.agent_alias_id, cli.agent_alias_id);
    set(&mut config.agent_endpoint, cli.agent_endpoint);
    set(&mut config.memory_id, cli.memory_id);
    set(&mut config.repository, cli.repository);
    set(&mut config.ref_, cli.ref_);
    set(&mut config.output, cli.output);

    // An explicitly empty pattern list clears the file's patterns.
    if let Some(patterns) = cli.ignore_patterns {
        config.ignore_patterns = split_csv(&patterns);
    }
    if let Some(path) = cli.ignore_file {
        config.ignore_file = path;
    }
    if let Some(url) = cli.github_api_url {
        config.github_api_url = url;
    }
    if let Some(limit) = cli.max_file_bytes {
        config.max_file_bytes = limit;
    }
    if let Some(limit) = cli.max_concurrent_fetches {
        config.max_concurrent_fetches = limit;
    }
    config.debug |= cli.debug;

    config
}
