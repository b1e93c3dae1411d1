//! HTTP client for the chat backend (http://127.0.0.1:8000 by default).

use async_trait::async_trait;
use std::time::Duration;

use super::schema::{parse_chat_response, ChatRequest};
use crate::config::EndpointConfig;

pub const DEFAULT_CHAT_PATH: &str = "/api/chat";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("chat endpoint returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("chat response is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("chat response does not match schema: {0}")]
    Schema(#[source] serde_json::Error),
    #[error("chat request task aborted: {0}")]
    Aborted(String),
}

/// Sends one message and yields the reply text. ChatView talks to the backend only through this.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, message: &str) -> Result<String, ChatError>;
}

/// reqwest-backed [`ChatTransport`].
#[derive(Clone)]
pub struct ChatClient {
    url: String,
    client: reqwest::Client,
}

impl ChatClient {
    /// Client for `{base_url}/api/chat` with the transport's default timeout.
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            url: join_url(base_url.as_ref(), DEFAULT_CHAT_PATH),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(endpoint: &EndpointConfig) -> Result<Self, ChatError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = endpoint.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            url: join_url(&endpoint.base_url, &endpoint.path),
            client: builder.build()?,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST /api/chat — returns the `response` field of the reply body.
    pub async fn chat(&self, message: &str) -> Result<String, ChatError> {
        let res = self
            .client
            .post(&self.url)
            .json(&ChatRequest { message })
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ChatError::Status { status, body });
        }
        let body = res.text().await?;
        Ok(parse_chat_response(&body)?.response)
    }
}

#[async_trait]
impl ChatTransport for ChatClient {
    async fn send(&self, message: &str) -> Result<String, ChatError> {
        self.chat(message).await
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
