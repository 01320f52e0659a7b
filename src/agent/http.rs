//! HTTP agent gateway client

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::{AgentError, AgentRequest, AgentSession};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeBody<'a> {
    input_text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    memory_id: Option<&'a str>,
    enable_trace: bool,
}

#[derive(Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    completion: Option<String>,
}

/// Talks to an agent gateway exposing
/// `POST /agents/{agentId}/agentAliases/{aliasId}/sessions/{sessionId}/text`.
#[derive(Debug, Clone)]
pub struct HttpAgentClient {
    endpoint: Url,
    http: reqwest::Client,
}

impl HttpAgentClient {
    pub fn new(endpoint: &str, api_key: Option<&str>) -> Result<Self> {
        let endpoint = Url::parse(endpoint.trim_end_matches('/'))
            .with_context(|| format!("Invalid agent endpoint: {endpoint}"))?;
        if endpoint.cannot_be_a_base() {
            anyhow::bail!("Invalid agent endpoint: {endpoint}");
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                .context("Agent API key contains invalid header characters")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build agent HTTP client")?;
        Ok(Self { endpoint, http })
    }

    fn invoke_url(&self, request: &AgentRequest) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend([
                "agents",
                request.agent_id.as_str(),
                "agentAliases",
                request.agent_alias_id.as_str(),
                "sessions",
                request.session_id.as_str(),
                "text",
            ]);
        }
        url
    }
}

#[async_trait]
impl AgentSession for HttpAgentClient {
    async fn invoke(&self, request: &AgentRequest) -> Result<String, AgentError> {
        let body = InvokeBody {
            input_text: &request.input_text,
            memory_id: request.memory_id.as_deref(),
            enable_trace: false,
        };
        tracing::debug!(
            "Invoking agent {} (alias {}) in session {}",
            request.agent_id,
            request.agent_alias_id,
            request.session_id
        );

        let response = self.http.post(self.invoke_url(request)).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AgentError::Status {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        let text = response.text().await?;
        let parsed: InvokeResponse =
            serde_json::from_str(&text).map_err(|e| AgentError::InvalidResponse(e.to_string()))?;
        match parsed.completion {
            Some(completion) if !completion.trim().is_empty() => Ok(completion),
            _ => Err(AgentError::EmptyResponse),
        }
    }
}
