//! AI proxy client
//!
//! Thin client for the external LLM endpoint behind the public chat and
//! TL;DR features. Requests are forwarded as OpenAI-style chat
//! completions; the API key never reaches the browser.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout for LLM calls; generation is slow but bounded
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum characters of post content sent for summarization
const TLDR_INPUT_LIMIT: usize = 16_000;

/// Error types for AI proxy operations
#[derive(Debug, thiserror::Error)]
pub enum AiClientError {
    /// The upstream endpoint was unreachable or returned a failure status
    #[error("AI endpoint unreachable: {0}")]
    ConnectionFailed(String),

    /// The upstream answered but the payload had an unexpected shape
    #[error("Unexpected AI response: {0}")]
    BadResponse(String),
}

/// One message in a chat exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}

/// Client for the external LLM endpoint
pub struct AiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl AiClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Send a chat exchange and return the assistant's reply text.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AiClientError> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiClientError::ConnectionFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AiClientError::ConnectionFailed(format!(
                "status {}",
                response.status()
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AiClientError::BadResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AiClientError::BadResponse("no choices in response".to_string()))
    }

    /// Summarize a blog post for the TL;DR endpoint.
    pub async fn summarize(&self, title: &str, text: &str) -> Result<String, AiClientError> {
        let mut text = text;
        if text.len() > TLDR_INPUT_LIMIT {
            // Truncate on a char boundary
            let mut end = TLDR_INPUT_LIMIT;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text = &text[..end];
        }

        let messages = [
            ChatMessage::system(
                "You summarize college radio station blog posts. \
                 Reply with a two or three sentence TL;DR, nothing else.",
            ),
            ChatMessage::user(format!("Title: {}\n\n{}", title, text)),
        ];
        self.chat(&messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_failed() {
        // Nothing listens on this port
        let client = AiClient::new("http://127.0.0.1:1/v1/chat/completions", "key", "model");
        let result = client.chat(&[ChatMessage::user("hi")]).await;
        assert!(matches!(result, Err(AiClientError::ConnectionFailed(_))));
    }

    #[test]
    fn test_chat_message_constructors() {
        let msg = ChatMessage::system("rules");
        assert_eq!(msg.role, "system");
        let msg = ChatMessage::user("question");
        assert_eq!(msg.role, "user");
    }
}
