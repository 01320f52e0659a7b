//! Core data types shared across the pipeline

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_IGNORE_FILE: &str = ".repoinsightignore";
pub const DEFAULT_MAX_FILE_BYTES: u64 = 1_048_576;
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 16;
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Status of a file as reported alongside its path.
///
/// Snapshot enumeration only ever produces [`FileStatus::Analyzed`]; the remaining
/// variants mirror the statuses a source-control host reports for changed files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Analyzed,
    Added,
    Modified,
    Removed,
    Renamed,
    Copied,
    Changed,
    Unchanged,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Analyzed => "analyzed",
            FileStatus::Added => "added",
            FileStatus::Modified => "modified",
            FileStatus::Removed => "removed",
            FileStatus::Renamed => "renamed",
            FileStatus::Copied => "copied",
            FileStatus::Changed => "changed",
            FileStatus::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file known to exist in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub status: FileStatus,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self { path: path.into(), status }
    }

    pub fn analyzed(path: impl Into<String>) -> Self {
        Self::new(path, FileStatus::Analyzed)
    }
}

/// What a snapshot source returned for a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotEntry {
    /// Raw bytes of a regular file.
    File(Vec<u8>),
    Directory,
    Symlink,
    Submodule,
}

impl SnapshotEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            SnapshotEntry::File(_) => "file",
            SnapshotEntry::Directory => "dir",
            SnapshotEntry::Symlink => "symlink",
            SnapshotEntry::Submodule => "submodule",
        }
    }
}

/// Run configuration after merging file, environment and CLI sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub instruction: Option<String>,

    #[serde(deserialize_with = "deserialize_string_list")]
    pub ignore_patterns: Vec<String>,

    pub ignore_file: PathBuf,

    pub agent_id: Option<String>,
    pub agent_alias_id: Option<String>,
    pub agent_endpoint: Option<String>,
    pub memory_id: Option<String>,

    pub repository: Option<String>,
    #[serde(rename = "ref")]
    pub ref_: Option<String>,
    pub github_api_url: String,

    pub max_file_bytes: u64,
    pub max_concurrent_fetches: usize,

    pub output: Option<PathBuf>,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instruction: None,
            ignore_patterns: Vec::new(),
            ignore_file: PathBuf::from(DEFAULT_IGNORE_FILE),
            agent_id: None,
            agent_alias_id: None,
            agent_endpoint: None,
            memory_id: None,
            repository: None,
            ref_: None,
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            output: None,
            debug: false,
        }
    }
}

/// Split a comma-delimited string into trimmed, non-empty parts.
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accept either `"a, b"` or `["a", "b"]` for list-valued settings.
fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => split_csv(&s),
        StringOrList::Many(items) => items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    })
}
