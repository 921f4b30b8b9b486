use crate::config::Config;
use crate::error::ReplyError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

/// Maps a user utterance to an assistant reply.
///
/// Implementations own their transport, timeouts and retries; the
/// conversation controller only sees `Ok(reply)` or `Err(_)`.
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    async fn ask(&self, utterance: &str) -> Result<String, ReplyError>;

    /// Whether the assistant currently looks reachable
    async fn health_check(&self) -> bool {
        true
    }
}

/// Request body for `POST /api/chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Response body for `POST /api/chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Reply provider backed by the assistant's HTTP API
#[derive(Clone)]
pub struct HttpReplyProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HttpReplyProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ReplyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &Config) -> Result<Self, ReplyError> {
        Self::new(
            config.api_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

#[async_trait]
impl ReplyProvider for HttpReplyProvider {
    async fn ask(&self, utterance: &str) -> Result<String, ReplyError> {
        let request = ChatRequest {
            message: utterance.to_string(),
        };

        let response = self.client.post(self.chat_url()).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReplyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ReplyError::Decode(e.to_string()))?;

        Ok(parsed.reply)
    }

    async fn health_check(&self) -> bool {
        match self.client.get(&self.base_url).send().await {
            Ok(response) if response.status().is_server_error() => {
                tracing::warn!(status = %response.status(), "health check answered with a server error");
                false
            }
            Ok(response) => {
                tracing::debug!(status = %response.status(), "health check answered");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped_from_base_url() {
        let provider = HttpReplyProvider::new("http://localhost:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(provider.base_url(), "http://localhost:8080");
        assert_eq!(provider.chat_url(), "http://localhost:8080/api/chat");
    }

    #[test]
    fn request_serializes_message_field() {
        let body = serde_json::to_value(ChatRequest {
            message: "docker ps".into(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "message": "docker ps" }));
    }
}
