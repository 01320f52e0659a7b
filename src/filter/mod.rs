//! Ignore rule merging and glob evaluation
//!
//! Rules come from two places: the caller's comma-delimited pattern list and the
//! repository's ignore file. Both are concatenated as-is into an [`IgnoreRuleSet`];
//! any match excludes a path, so order and duplicates don't matter.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::domain::split_csv;
use crate::utils::normalize_path;

/// Merged, read-only collection of ignore patterns for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRuleSet {
    patterns: Vec<String>,
}

impl IgnoreRuleSet {
    /// Merge caller-supplied patterns with the text of an ignore file.
    ///
    /// Each caller entry may itself be a comma-delimited list. Ignore file lines are
    /// trimmed; blank lines and `#` comments contribute nothing.
    pub fn merge<S: AsRef<str>>(caller_patterns: &[S], ignore_file_text: Option<&str>) -> Self {
        let mut patterns: Vec<String> =
            caller_patterns.iter().flat_map(|entry| split_csv(entry.as_ref())).collect();
        if let Some(text) = ignore_file_text {
            patterns.extend(parse_ignore_file(text));
        }
        Self { patterns }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Compile the rule set into a matcher. Patterns that aren't valid globs are skipped.
    pub fn compile(&self) -> PatternFilter {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.patterns {
            for candidate in expand_pattern(pattern) {
                let built = GlobBuilder::new(&candidate)
                    .literal_separator(true)
                    .backslash_escape(true)
                    .build();
                match built {
                    Ok(glob) => {
                        builder.add(glob);
                    }
                    Err(e) => {
                        tracing::warn!("Skipping invalid ignore pattern '{}': {}", pattern, e);
                        break;
                    }
                }
            }
        }
        let set = builder.build().unwrap_or_else(|e| {
            tracing::warn!("Failed to build ignore pattern set, ignoring nothing: {}", e);
            GlobSet::empty()
        });
        PatternFilter { set }
    }
}

/// Extract patterns from ignore file text, one per non-empty, non-comment line.
pub fn parse_ignore_file(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Compiled form of an [`IgnoreRuleSet`].
#[derive(Debug, Clone)]
pub struct PatternFilter {
    set: GlobSet,
}

impl PatternFilter {
    pub fn is_ignored(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.set.is_match(path.trim_start_matches("./"))
    }
}

/// One-shot check of a path against a rule set.
pub fn is_ignored(path: &str, rules: &IgnoreRuleSet) -> bool {
    rules.compile().is_ignored(path)
}

/// Turn an ignore pattern into the globs that implement it.
///
/// - `*` stays within a segment, `**` crosses segments.
/// - A leading `/` anchors the pattern at the repository root.
/// - A pattern without an inner `/` matches at any depth (`*.md` hits `docs/a.md`).
/// - Anything matched also excludes everything beneath it, so `dist/` and `dist`
///   both exclude `dist/app.js`.
/// - `\` escapes the next character (`\#notes`, `\*.txt`); only paths are normalized.
fn expand_pattern(pattern: &str) -> Vec<String> {
    let anchored = pattern.starts_with('/');
    let body = pattern.trim_start_matches("./").trim_start_matches('/').trim_end_matches('/');
    if body.is_empty() {
        return Vec::new();
    }

    let base = if anchored || body.contains('/') { body.to_string() } else { format!("**/{body}") };

    if base.ends_with("/**") {
        vec![base]
    } else {
        let nested = format!("{base}/**");
        vec![base, nested]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(patterns: &[&str]) -> IgnoreRuleSet {
        IgnoreRuleSet::merge(patterns, None)
    }

    #[test]
    fn merge_combines_caller_and_ignore_file() {
        let set = IgnoreRuleSet::merge(&["*.md"], Some("node_modules/\n# comment\n\ndist/"));
        assert_eq!(set.patterns(), &["*.md", "node_modules/", "dist/"]);

        let filter = set.compile();
        assert!(filter.is_ignored("README.md"));
        assert!(filter.is_ignored("docs/guide/intro.md"));
        assert!(filter.is_ignored("node_modules/left-pad/index.js"));
        assert!(filter.is_ignored("dist/app.js"));
        assert!(!filter.is_ignored("src/main.rs"));
        assert!(!filter.is_ignored("src/markdown.rs"));
    }

    #[test]
    fn caller_entries_are_split_on_commas() {
        let set = IgnoreRuleSet::merge(&[" *.log , ,target/** ", "*.tmp"], None);
        assert_eq!(set.patterns(), &["*.log", "target/**", "*.tmp"]);
    }

    #[test]
    fn ignore_file_skips_indented_comments_and_crlf() {
        let parsed = parse_ignore_file("  # indented comment\r\n*.bin\r\n\r\n   \n/build\n");
        assert_eq!(parsed, vec!["*.bin", "/build"]);
    }

    #[test]
    fn absent_inputs_ignore_nothing() {
        let set = IgnoreRuleSet::merge::<&str>(&[], None);
        assert!(set.is_empty());
        assert!(!set.compile().is_ignored("anything/at/all.txt"));
    }

    #[test]
    fn single_star_stays_within_a_segment() {
        let filter = rules(&["src/*.rs"]).compile();
        assert!(filter.is_ignored("src/lib.rs"));
        assert!(!filter.is_ignored("src/nested/lib.rs"));
    }

    #[test]
    fn double_star_crosses_segments() {
        let filter = rules(&["src/**/*.snap"]).compile();
        assert!(filter.is_ignored("src/a.snap"));
        assert!(filter.is_ignored("src/a/b/c.snap"));
        assert!(!filter.is_ignored("tests/a.snap"));
    }

    #[test]
    fn leading_slash_anchors_to_root() {
        let filter = rules(&["/build"]).compile();
        assert!(filter.is_ignored("build/out.o"));
        assert!(!filter.is_ignored("crates/build/out.o"));
    }

    #[test]
    fn bare_name_excludes_directory_contents_at_any_depth() {
        let filter = rules(&["vendor"]).compile();
        assert!(filter.is_ignored("vendor"));
        assert!(filter.is_ignored("vendor/lib/a.go"));
        assert!(filter.is_ignored("third_party/vendor/b.go"));
        assert!(!filter.is_ignored("vendored.go"));
    }

    #[test]
    fn invalid_patterns_are_skipped() {
        let filter = rules(&["src/[", "*.lock"]).compile();
        assert!(filter.is_ignored("Cargo.lock"));
        assert!(!filter.is_ignored("src/main.rs"));
    }

    #[test]
    fn backslash_escapes_stay_literal() {
        let filter = rules(&["\\#notes", "\\*.txt"]).compile();
        assert!(filter.is_ignored("#notes"));
        assert!(filter.is_ignored("docs/#notes"));
        assert!(filter.is_ignored("*.txt"));
        assert!(!filter.is_ignored("a.txt"));
        assert!(!filter.is_ignored("notes"));
    }

    #[test]
    fn windows_style_paths_are_normalized() {
        let filter = rules(&["build/"]).compile();
        assert!(filter.is_ignored("build\\out.o"));
    }

    #[test]
    fn duplicates_are_inert() {
        assert_eq!(
            is_ignored("a.log", &rules(&["*.log", "*.log"])),
            is_ignored("a.log", &rules(&["*.log"]))
        );
    }
}
