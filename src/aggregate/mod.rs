//! Context aggregation: filter candidate files, fetch them concurrently, and
//! collect content blocks and status entries.
//!
//! Each file is handled by its own task that returns `(Option<ContentBlock>,
//! StatusEntry)`. Results are joined in input order, so the output is
//! deterministic regardless of which fetch finishes first.

use futures::stream::{self, StreamExt};

use crate::domain::{FileRecord, FileStatus, SnapshotEntry, DEFAULT_MAX_CONCURRENT_FETCHES};
use crate::filter::{IgnoreRuleSet, PatternFilter};
use crate::snapshot::{FetchError, SnapshotSource};
use crate::utils::decode_text;

/// Rendered content of one included file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    pub path: String,
    pub text: String,
}

impl ContentBlock {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self { path: path.into(), text: text.into() }
    }

    /// `Content of <path>` followed by the fenced text.
    pub fn render(&self) -> String {
        let fence = fence_for(&self.text);
        let body = self.text.strip_suffix('\n').unwrap_or(&self.text);
        format!("Content of {}\n{fence}\n{body}\n{fence}\n", self.path)
    }
}

/// One status line, emitted for every file that survives filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: String,
    pub status: FileStatus,
}

impl StatusEntry {
    pub fn render(&self) -> String {
        format!("File: {} (Status: {})\n", self.path, self.status)
    }
}

impl From<&FileRecord> for StatusEntry {
    fn from(record: &FileRecord) -> Self {
        Self { path: record.path.clone(), status: record.status }
    }
}

/// Everything the prompt and report need from one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptContext {
    pub content_blocks: Vec<ContentBlock>,
    pub status_entries: Vec<StatusEntry>,
    /// Records that survived filtering, in enumeration order.
    pub records: Vec<FileRecord>,
}

impl PromptContext {
    /// True when there is nothing worth sending to the agent.
    pub fn is_empty(&self) -> bool {
        self.content_blocks.is_empty() && self.status_entries.is_empty()
    }
}

/// Fans out over candidate files and gathers their context.
pub struct ContextAggregator<'a> {
    source: &'a dyn SnapshotSource,
    max_file_bytes: Option<u64>,
    concurrency: usize,
}

impl<'a> ContextAggregator<'a> {
    pub fn new(source: &'a dyn SnapshotSource) -> Self {
        Self { source, max_file_bytes: None, concurrency: DEFAULT_MAX_CONCURRENT_FETCHES }
    }

    /// Files larger than this keep their status entry but contribute no content.
    pub fn max_file_bytes(mut self, limit: u64) -> Self {
        self.max_file_bytes = Some(limit);
        self
    }

    /// Upper bound on in-flight fetches.
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    pub async fn aggregate(&self, files: &[FileRecord], filter: &PatternFilter) -> PromptContext {
        let admitted: Vec<&FileRecord> =
            files.iter().filter(|record| !filter.is_ignored(&record.path)).collect();
        tracing::debug!(
            "{} of {} files admitted after ignore rules",
            admitted.len(),
            files.len()
        );

        let results: Vec<(Option<ContentBlock>, StatusEntry)> = stream::iter(admitted.iter())
            .map(|record| self.collect_one(record))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut context = PromptContext {
            records: admitted.into_iter().cloned().collect(),
            ..PromptContext::default()
        };
        for (block, status) in results {
            if let Some(block) = block {
                context.content_blocks.push(block);
            }
            context.status_entries.push(status);
        }
        context
    }

    async fn collect_one(&self, record: &FileRecord) -> (Option<ContentBlock>, StatusEntry) {
        let block = match self.fetch_text(&record.path).await {
            Ok(text) => Some(ContentBlock::new(record.path.clone(), text)),
            Err(e) => {
                tracing::warn!("Skipping content of {}: {}", record.path, e);
                None
            }
        };
        (block, StatusEntry::from(record))
    }

    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let bytes = match self.source.fetch(path).await? {
            SnapshotEntry::File(bytes) => bytes,
            other => return Err(FetchError::NotAFile(other.kind())),
        };
        if let Some(limit) = self.max_file_bytes {
            let size = bytes.len() as u64;
            if size > limit {
                return Err(FetchError::TooLarge { size, limit });
            }
        }
        Ok(decode_text(&bytes)?.text)
    }
}

/// Aggregate with default limits.
pub async fn aggregate(
    files: &[FileRecord],
    rules: &IgnoreRuleSet,
    source: &dyn SnapshotSource,
) -> PromptContext {
    ContextAggregator::new(source).aggregate(files, &rules.compile()).await
}

/// A backtick fence longer than any run of backticks inside `text`.
fn fence_for(text: &str) -> String {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    "`".repeat(longest.max(2) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    enum Stub {
        File(&'static str, u64),
        Dir,
        Missing,
    }

    struct StubSource {
        entries: HashMap<&'static str, Stub>,
    }

    impl StubSource {
        fn new(entries: Vec<(&'static str, Stub)>) -> Self {
            Self { entries: entries.into_iter().collect() }
        }
    }

    #[async_trait]
    impl SnapshotSource for StubSource {
        async fn list_files(&self) -> anyhow::Result<Vec<FileRecord>> {
            let mut paths: Vec<&str> = self.entries.keys().copied().collect();
            paths.sort();
            Ok(paths.into_iter().map(FileRecord::analyzed).collect())
        }

        async fn fetch(&self, path: &str) -> Result<SnapshotEntry, FetchError> {
            match self.entries.get(path) {
                Some(Stub::File(body, delay_ms)) => {
                    tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                    Ok(SnapshotEntry::File(body.as_bytes().to_vec()))
                }
                Some(Stub::Dir) => Ok(SnapshotEntry::Directory),
                Some(Stub::Missing) | None => Err(FetchError::NotFound),
            }
        }
    }

    fn records(paths: &[&str]) -> Vec<FileRecord> {
        paths.iter().map(|p| FileRecord::analyzed(*p)).collect()
    }

    #[tokio::test]
    async fn ignored_files_produce_nothing() {
        let source = StubSource::new(vec![
            ("a.txt", Stub::File("hello", 0)),
            ("b.log", Stub::File("noise", 0)),
        ]);
        let rules = IgnoreRuleSet::merge(&["*.log"], None);
        let context = aggregate(&records(&["a.txt", "b.log"]), &rules, &source).await;

        assert_eq!(context.content_blocks, vec![ContentBlock::new("a.txt", "hello")]);
        assert_eq!(context.status_entries.len(), 1);
        assert_eq!(context.status_entries[0].path, "a.txt");
        assert_eq!(context.records, records(&["a.txt"]));
    }

    #[tokio::test]
    async fn failed_fetch_keeps_status_entry() {
        let source = StubSource::new(vec![
            ("ok.rs", Stub::File("fn ok() {}", 0)),
            ("gone.rs", Stub::Missing),
            ("src", Stub::Dir),
        ]);
        let context = aggregate(
            &records(&["ok.rs", "gone.rs", "src"]),
            &IgnoreRuleSet::default(),
            &source,
        )
        .await;

        assert_eq!(context.status_entries.len(), 3);
        assert_eq!(context.content_blocks.len(), 1);
        assert_eq!(context.content_blocks[0].path, "ok.rs");
    }

    #[tokio::test]
    async fn output_follows_input_order_not_completion_order() {
        let source = StubSource::new(vec![
            ("first.txt", Stub::File("1", 40)),
            ("second.txt", Stub::File("2", 0)),
            ("third.txt", Stub::File("3", 20)),
        ]);
        let context = aggregate(
            &records(&["first.txt", "second.txt", "third.txt"]),
            &IgnoreRuleSet::default(),
            &source,
        )
        .await;

        let order: Vec<&str> = context.content_blocks.iter().map(|b| b.path.as_str()).collect();
        assert_eq!(order, vec!["first.txt", "second.txt", "third.txt"]);
        let order: Vec<&str> = context.status_entries.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(order, vec!["first.txt", "second.txt", "third.txt"]);
    }

    #[tokio::test]
    async fn oversized_files_are_status_only() {
        let source = StubSource::new(vec![("big.txt", Stub::File("0123456789", 0))]);
        let context = ContextAggregator::new(&source)
            .max_file_bytes(4)
            .concurrency(0)
            .aggregate(&records(&["big.txt"]), &IgnoreRuleSet::default().compile())
            .await;

        assert!(context.content_blocks.is_empty());
        assert_eq!(context.status_entries.len(), 1);
        assert!(!context.is_empty());
    }

    #[tokio::test]
    async fn everything_ignored_is_empty() {
        let source = StubSource::new(vec![("a.md", Stub::File("doc", 0))]);
        let rules = IgnoreRuleSet::merge(&["*.md"], None);
        let context = aggregate(&records(&["a.md"]), &rules, &source).await;
        assert!(context.is_empty());
        assert!(context.records.is_empty());
    }

    #[test]
    fn content_block_renders_fenced_text() {
        let block = ContentBlock::new("src/a.rs", "fn a() {}\n");
        assert_eq!(block.render(), "Content of src/a.rs\n```\nfn a() {}\n```\n");
    }

    #[test]
    fn fence_grows_past_embedded_backticks() {
        let block = ContentBlock::new("README.md", "```rust\nx\n```");
        assert!(block.render().starts_with("Content of README.md\n````\n"));
    }

    #[test]
    fn status_entry_renders_line() {
        let entry = StatusEntry::from(&FileRecord::analyzed("a.txt"));
        assert_eq!(entry.render(), "File: a.txt (Status: analyzed)\n");
    }
}
