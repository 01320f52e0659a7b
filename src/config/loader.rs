//! Config file loading

use crate::domain::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const SECTION: &str = "repo-insight";

pub fn load_config(workspace: &Path, config_path: Option<&Path>) -> Result<Config> {
    let config_path_provided = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(workspace),
    };

    let Some(config_file) = discovered else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "toml" => parse_toml_config(&content, &config_file),
        "yaml" | "yml" => parse_yaml_config(&content, &config_file),
        other => Err(anyhow::anyhow!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        )),
    };

    match parsed {
        Ok(cfg) => Ok(cfg),
        Err(e) if config_path_provided => Err(e),
        Err(e) => {
            // Auto-discovered files never block a run.
            tracing::warn!(
                "Failed to load auto-discovered config {}: {:#}",
                config_file.display(),
                e
            );
            Ok(Config::default())
        }
    }
}

/// Parse TOML config, accepting an optional `[repo-insight]` section.
fn parse_toml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: toml::Value = toml::from_str(content)
        .with_context(|| format!("Invalid TOML syntax: {}", config_file.display()))?;

    let config_val = match raw.get(SECTION) {
        Some(nested) => nested.clone(),
        None => raw,
    };

    config_val.try_into().with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}

/// Parse YAML config, accepting an optional `repo-insight:` section.
fn parse_yaml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .with_context(|| format!("Invalid YAML syntax: {}", config_file.display()))?;

    let config_val = match raw.get(SECTION) {
        Some(nested) => nested.clone(),
        None => raw,
    };

    serde_yaml::from_value(config_val)
        .with_context(|| format!("Invalid YAML config: {}", config_file.display()))
}

fn discover_config(workspace: &Path) -> Option<PathBuf> {
    let candidates = [
        "repo-insight.toml",
        ".repo-insight.toml",
        "repo-insight.yml",
        ".repo-insight.yml",
        "repo-insight.yaml",
        ".repo-insight.yaml",
    ];

    candidates.iter().map(|c| workspace.join(c)).find(|path| path.is_file())
}

/// Read the repository ignore file if it exists. Absence is not an error.
pub fn read_ignore_file(workspace: &Path, ignore_file: &Path) -> Result<Option<String>> {
    let path = if ignore_file.is_absolute() {
        ignore_file.to_path_buf()
    } else {
        workspace.join(ignore_file)
    };
    if !path.is_file() {
        tracing::debug!("No ignore file at {}", path.display());
        return Ok(None);
    }
    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed reading ignore file: {}", path.display()))?;
    Ok(Some(text))
}
