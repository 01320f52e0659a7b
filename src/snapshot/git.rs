//! Local git repository snapshot source

use anyhow::{Context, Result};
use async_trait::async_trait;
use git2::{ErrorCode, ObjectType, Oid, Repository, TreeWalkMode, TreeWalkResult};
use std::path::Path;
use std::sync::Mutex;

use super::{FetchError, RefSelector, SnapshotSource};
use crate::domain::{FileRecord, SnapshotEntry};

const SYMLINK_FILEMODE: i32 = 0o120000;

/// Reads the tree of one commit in a local repository.
///
/// Working-tree changes are invisible: only committed content is served.
pub struct GitSnapshot {
    repo: Mutex<Repository>,
    tree_id: Oid,
    reference: String,
}

impl GitSnapshot {
    /// Open the repository containing `path` and resolve the snapshot ref.
    /// [`RefSelector::DefaultBranch`] means whatever `HEAD` points at.
    pub fn open(path: &Path, selector: RefSelector) -> Result<Self> {
        let repo = Repository::discover(path)
            .with_context(|| format!("No git repository found at {}", path.display()))?;

        let reference = match selector {
            RefSelector::Named(name) => name,
            RefSelector::DefaultBranch => "HEAD".to_string(),
        };
        let tree_id = {
            let object = repo
                .revparse_single(&reference)
                .with_context(|| format!("Failed to resolve ref: {reference}"))?;
            let tree = object
                .peel_to_tree()
                .with_context(|| format!("Ref does not point at a tree: {reference}"))?;
            tree.id()
        };

        Ok(Self { repo: Mutex::new(repo), tree_id, reference })
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Repository> {
        self.repo.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SnapshotSource for GitSnapshot {
    async fn list_files(&self) -> Result<Vec<FileRecord>> {
        let repo = self.lock();
        let tree = repo.find_tree(self.tree_id).context("Snapshot tree disappeared")?;

        let mut files = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            if matches!(entry.kind(), Some(ObjectType::Blob) | Some(ObjectType::Commit)) {
                if let Some(name) = entry.name() {
                    files.push(FileRecord::analyzed(format!("{root}{name}")));
                }
            }
            TreeWalkResult::Ok
        })
        .context("Failed to walk snapshot tree")?;

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    async fn fetch(&self, path: &str) -> Result<SnapshotEntry, FetchError> {
        let repo = self.lock();
        let tree = repo.find_tree(self.tree_id)?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Err(FetchError::NotFound),
            Err(e) => return Err(e.into()),
        };

        match entry.kind() {
            Some(ObjectType::Tree) => Ok(SnapshotEntry::Directory),
            Some(ObjectType::Commit) => Ok(SnapshotEntry::Submodule),
            Some(ObjectType::Blob) if entry.filemode() == SYMLINK_FILEMODE => {
                Ok(SnapshotEntry::Symlink)
            }
            Some(ObjectType::Blob) => {
                let blob = repo.find_blob(entry.id())?;
                Ok(SnapshotEntry::File(blob.content().to_vec()))
            }
            _ => Err(FetchError::NotAFile("unknown")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn commit_all(repo: &Repository, message: &str) {
        let mut index = repo.index().unwrap();
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("Test", "test@example.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents).unwrap();
    }

    fn fixture() -> (TempDir, Repository) {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::init(tmp.path()).unwrap();
        fs::create_dir_all(tmp.path().join("src/nested")).unwrap();
        fs::write(tmp.path().join("README.md"), "# demo\n").unwrap();
        fs::write(tmp.path().join("src/lib.rs"), "pub fn demo() {}\n").unwrap();
        fs::write(tmp.path().join("src/nested/mod.rs"), "// nested\n").unwrap();
        commit_all(&repo, "initial");
        (tmp, repo)
    }

    #[tokio::test]
    async fn lists_committed_files_sorted() {
        let (tmp, _repo) = fixture();
        let snapshot = GitSnapshot::open(tmp.path(), RefSelector::DefaultBranch).unwrap();
        let files = snapshot.list_files().await.unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "src/lib.rs", "src/nested/mod.rs"]);
    }

    #[tokio::test]
    async fn fetches_blob_bytes_and_classifies_directories() {
        let (tmp, _repo) = fixture();
        let snapshot = GitSnapshot::open(tmp.path(), RefSelector::DefaultBranch).unwrap();

        assert_eq!(
            snapshot.fetch("src/lib.rs").await.unwrap(),
            SnapshotEntry::File(b"pub fn demo() {}\n".to_vec())
        );
        assert_eq!(snapshot.fetch("src/nested").await.unwrap(), SnapshotEntry::Directory);
        assert!(matches!(snapshot.fetch("missing.txt").await, Err(FetchError::NotFound)));
    }

    #[tokio::test]
    async fn named_ref_pins_an_older_commit() {
        let (tmp, repo) = fixture();
        let first = repo.head().unwrap().peel_to_commit().unwrap().id().to_string();
        fs::write(tmp.path().join("later.txt"), "added later").unwrap();
        commit_all(&repo, "second");

        let snapshot = GitSnapshot::open(tmp.path(), RefSelector::Named(first)).unwrap();
        let files = snapshot.list_files().await.unwrap();
        assert!(!files.iter().any(|f| f.path == "later.txt"));
    }

    #[test]
    fn unknown_ref_is_an_error() {
        let (tmp, _repo) = fixture();
        assert!(GitSnapshot::open(tmp.path(), RefSelector::Named("nope".into())).is_err());
    }
}
