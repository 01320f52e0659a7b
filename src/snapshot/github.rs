//! GitHub REST snapshot source

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use super::{FetchError, RefSelector, SnapshotSource};
use crate::domain::{FileRecord, SnapshotEntry};
use crate::utils::normalize_path;

const API_VERSION: &str = "2022-11-28";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";

/// Reads one ref of a GitHub repository through the REST API.
#[derive(Debug, Clone)]
pub struct GitHubSnapshot {
    http: reqwest::Client,
    api_url: Url,
    owner: String,
    repo: String,
    reference: String,
    max_file_bytes: Option<u64>,
}

#[derive(Deserialize)]
struct RepositoryResponse {
    default_branch: String,
}

#[derive(Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    size: Option<u64>,
}

impl GitHubSnapshot {
    /// Connect to `repository` (`owner/repo`) and pin the snapshot ref.
    ///
    /// [`RefSelector::DefaultBranch`] costs one extra request to look the branch up.
    pub async fn open(
        api_url: &str,
        repository: &str,
        token: Option<&str>,
        selector: RefSelector,
    ) -> Result<Self> {
        let (owner, repo) = split_repository(repository)?;
        let api_url = Url::parse(api_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid GitHub API URL: {api_url}"))?;
        if api_url.cannot_be_a_base() {
            anyhow::bail!("Invalid GitHub API URL: {api_url}");
        }

        let http = reqwest::Client::builder()
            .default_headers(default_headers(token)?)
            .build()
            .context("Failed to build GitHub HTTP client")?;

        let mut snapshot = Self {
            http,
            api_url,
            owner,
            repo,
            reference: String::new(),
            max_file_bytes: None,
        };
        snapshot.reference = match selector {
            RefSelector::Named(name) => name,
            RefSelector::DefaultBranch => snapshot.default_branch().await?,
        };
        tracing::debug!(
            "GitHub snapshot {}/{} at {}",
            snapshot.owner,
            snapshot.repo,
            snapshot.reference
        );
        Ok(snapshot)
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Refuse files the contents API reports as larger than `limit`, before any
    /// content is decoded or downloaded.
    pub fn max_file_bytes(mut self, limit: u64) -> Self {
        self.max_file_bytes = Some(limit);
        self
    }

    async fn default_branch(&self) -> Result<String> {
        let url = self.endpoint(&[]);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to query repository {}/{}", self.owner, self.repo))?;
        let response = error_for_status(response)
            .await
            .with_context(|| format!("Failed to query repository {}/{}", self.owner, self.repo))?;
        let body: RepositoryResponse =
            response.json().await.context("Invalid repository response")?;
        Ok(body.default_branch)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["repos", self.owner.as_str(), self.repo.as_str()])
                .extend(segments);
        }
        url
    }

    async fn fetch_raw(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let response = self.http.get(url).header(ACCEPT, RAW_MEDIA_TYPE).send().await?;
        let response = check_fetch_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl SnapshotSource for GitHubSnapshot {
    async fn list_files(&self) -> Result<Vec<FileRecord>> {
        let mut url = self.endpoint(&["git", "trees", self.reference.as_str()]);
        url.query_pairs_mut().append_pair("recursive", "1");

        let response = self.http.get(url).send().await.context("Failed to list repository tree")?;
        let response = error_for_status(response)
            .await
            .with_context(|| format!("Failed to list tree at {}", self.reference))?;
        let body: TreeResponse = response.json().await.context("Invalid tree response")?;

        if body.truncated {
            tracing::warn!(
                "GitHub truncated the tree listing for {}/{}; some files will be missing",
                self.owner,
                self.repo
            );
        }

        let mut files: Vec<FileRecord> = body
            .tree
            .into_iter()
            .filter(|entry| entry.kind == "blob")
            .map(|entry| FileRecord::analyzed(normalize_path(&entry.path)))
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    async fn fetch(&self, path: &str) -> Result<SnapshotEntry, FetchError> {
        let mut segments = vec!["contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let mut url = self.endpoint(&segments);
        url.query_pairs_mut().append_pair("ref", &self.reference);

        let response = self.http.get(url.clone()).send().await?;
        let response = check_fetch_status(response).await?;
        let body: serde_json::Value = response.json().await?;

        // Directory listings come back as arrays.
        if body.is_array() {
            return Ok(SnapshotEntry::Directory);
        }
        let content: ContentResponse = serde_json::from_value(body)
            .map_err(|e| FetchError::Api { status: 200, message: e.to_string() })?;

        match content.kind.as_str() {
            "file" => {}
            "dir" => return Ok(SnapshotEntry::Directory),
            "symlink" => return Ok(SnapshotEntry::Symlink),
            "submodule" => return Ok(SnapshotEntry::Submodule),
            other => {
                return Err(FetchError::Api {
                    status: 200,
                    message: format!("unknown content type '{other}'"),
                })
            }
        }

        if let (Some(size), Some(limit)) = (content.size, self.max_file_bytes) {
            if size > limit {
                return Err(FetchError::TooLarge { size, limit });
            }
        }

        match (content.encoding.as_deref(), content.content) {
            (Some("base64"), Some(encoded)) => {
                let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
                let bytes = BASE64_STANDARD
                    .decode(compact)
                    .map_err(|e| FetchError::Api { status: 200, message: e.to_string() })?;
                Ok(SnapshotEntry::File(bytes))
            }
            // Files over 1 MB come back without inline content.
            _ => Ok(SnapshotEntry::File(self.fetch_raw(url).await?)),
        }
    }
}

fn default_headers(token: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("repo-insight/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
    if let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("GitHub token contains invalid header characters")?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

/// Split `owner/repo`, tolerating a full `https://github.com/owner/repo(.git)` URL.
pub fn split_repository(repository: &str) -> Result<(String, String)> {
    let trimmed = repository
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("github.com/")
        .trim_end_matches('/')
        .trim_end_matches(".git");
    match trimmed.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => anyhow::bail!("Repository must be in 'owner/repo' form, got '{repository}'"),
    }
}

async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("GitHub API returned {status}: {}", body.trim())
}

async fn check_fetch_status(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound);
    }
    let message = response.text().await.unwrap_or_default();
    Err(FetchError::Api { status: status.as_u16(), message: message.trim().to_string() })
}
