//! Repository snapshot sources (GitHub REST, local git)

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{FileRecord, SnapshotEntry};
use crate::utils::DecodeError;

pub mod git;
pub mod github;

pub use git::GitSnapshot;
pub use github::GitHubSnapshot;

/// Which ref a snapshot should be read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefSelector {
    /// A branch, tag or commit named by the caller or the triggering event.
    Named(String),
    /// Whatever the repository's default branch is.
    DefaultBranch,
}

impl RefSelector {
    pub fn from_option(reference: Option<&str>) -> Self {
        match reference.map(str::trim).filter(|r| !r.is_empty()) {
            Some(r) => RefSelector::Named(r.to_string()),
            None => RefSelector::DefaultBranch,
        }
    }
}

/// Failure to obtain usable content for one file. Never fatal to a run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("not found")]
    NotFound,
    #[error("not a regular file ({0})")]
    NotAFile(&'static str),
    #[error("{size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("could not decode content: {0}")]
    Decode(#[from] DecodeError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
}

/// Enumerates the files of a repository at one ref and returns their bytes.
///
/// Implementations are constructed once per run and shared by every fetch task.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// List every file in the snapshot, sorted by path.
    async fn list_files(&self) -> anyhow::Result<Vec<FileRecord>>;

    /// Fetch the raw entry for one path.
    async fn fetch(&self, path: &str) -> Result<SnapshotEntry, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::RefSelector;

    #[test]
    fn blank_ref_means_default_branch() {
        assert_eq!(RefSelector::from_option(None), RefSelector::DefaultBranch);
        assert_eq!(RefSelector::from_option(Some("  ")), RefSelector::DefaultBranch);
        assert_eq!(
            RefSelector::from_option(Some("release/1.2")),
            RefSelector::Named("release/1.2".to_string())
        );
    }
}
