//! Path normalization

/// Normalize a repository-relative path to forward slashes.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}
