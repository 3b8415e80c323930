//! LLM provider layer, the single point of entry for all AI calls.
//!
//! ARCHITECTURAL RULE: no other module may call a provider API directly.
//! Handlers talk to [`executor::FallbackExecutor`], which walks an ordered
//! provider list and records usage for every attempt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub mod anthropic;
pub mod executor;
pub mod openai;
pub mod parse;
pub mod prompts;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// The contract an LLM provider implements to join the fallback chain.
///
/// `complete` performs exactly one API round: no internal retry, no backoff.
/// Retry policy lives in the executor (one pass over the provider list).
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Unique provider identifier (e.g. "anthropic", "openai").
    fn name(&self) -> &'static str;

    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    /// Performs a chat completion and returns the raw response text.
    /// An empty string is a valid return; the executor treats it as a miss.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AppError>;
}
