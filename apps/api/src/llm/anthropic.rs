//! Anthropic Messages API provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::llm::{ChatMessage, CompletionProvider, MessageRole};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const MAX_TOKENS: u32 = 4096;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// The Messages API takes the system prompt as a top-level field, not as
    /// a message. System entries are concatenated; the rest pass through.
    fn split_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<WireMessage>) {
        let mut system_parts = Vec::new();
        let mut wire = Vec::new();
        for msg in messages {
            match msg.role {
                MessageRole::System => system_parts.push(msg.content.clone()),
                MessageRole::User => wire.push(WireMessage {
                    role: "user",
                    content: msg.content.clone(),
                }),
                MessageRole::Assistant => wire.push(WireMessage {
                    role: "assistant",
                    content: msg.content.clone(),
                }),
            }
        }
        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };
        (system, wire)
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AppError> {
        let (system, wire) = Self::split_messages(messages);
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system,
            messages: wire,
        };

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::AiProvider(format!("anthropic request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(AppError::AiProvider(format!(
                "anthropic returned {status}: {detail}"
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AppError::AiProvider(format!("anthropic response decode failed: {e}")))?;

        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "anthropic usage"
            );
        }

        let text = parsed
            .content
            .iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text.clone())
            .unwrap_or_default();

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_messages_lift_to_top_level() {
        let messages = vec![
            ChatMessage::system("you are concise"),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
            ChatMessage::user("how are you"),
        ];
        let (system, wire) = AnthropicProvider::split_messages(&messages);
        assert_eq!(system.as_deref(), Some("you are concise"));
        assert_eq!(wire.len(), 3);
        assert_eq!(wire[0].role, "user");
        assert_eq!(wire[1].role, "assistant");
    }

    #[test]
    fn test_no_system_messages_yields_none() {
        let messages = vec![ChatMessage::user("hi")];
        let (system, wire) = AnthropicProvider::split_messages(&messages);
        assert!(system.is_none());
        assert_eq!(wire.len(), 1);
    }

    #[test]
    fn test_multiple_system_messages_concatenate() {
        let messages = vec![
            ChatMessage::system("part one"),
            ChatMessage::system("part two"),
        ];
        let (system, wire) = AnthropicProvider::split_messages(&messages);
        assert_eq!(system.as_deref(), Some("part one\n\npart two"));
        assert!(wire.is_empty());
    }
}
