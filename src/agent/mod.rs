//! Agent session boundary

use async_trait::async_trait;
use thiserror::Error;

pub mod http;

pub use http::HttpAgentClient;

/// One prompt exchange with the agent backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRequest {
    pub agent_id: String,
    pub agent_alias_id: String,
    pub session_id: String,
    pub memory_id: Option<String>,
    pub input_text: String,
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("agent returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("agent returned an empty completion")]
    EmptyResponse,
    #[error("agent returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Exchanges a rendered prompt for the agent's response text.
#[async_trait]
pub trait AgentSession: Send + Sync {
    async fn invoke(&self, request: &AgentRequest) -> Result<String, AgentError>;
}
