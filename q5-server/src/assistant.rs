//! AI chat assistant
//!
//! Conversations are forwarded to an OpenAI-compatible
//! `/chat/completions` endpoint behind the [`ChatBackend`] trait.

use std::time::Duration;

use async_trait::async_trait;
use q5_core::config::AssistantSection;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::ValidationError;

/// Most turns accepted per request
pub const MAX_MESSAGES: usize = 20;

/// Longest single turn, in characters
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Upstream error bodies are cut to this many characters in logs
const LOG_BODY_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Assistant errors
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// No API key configured
    #[error("assistant is not configured")]
    NotConfigured,

    #[error("assistant upstream returned {status}")]
    Upstream { status: u16 },

    #[error("assistant request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("assistant response invalid: {0}")]
    InvalidResponse(String),
}

/// Check a client-supplied conversation before it leaves the server.
pub fn validate_conversation(messages: &[ChatMessage]) -> Result<(), ValidationError> {
    if messages.is_empty() {
        return Err(ValidationError::Empty { field: "messages" });
    }
    if messages.len() > MAX_MESSAGES {
        return Err(ValidationError::TooMany {
            field: "messages",
            max: MAX_MESSAGES,
        });
    }

    for message in messages {
        if message.role == ChatRole::System {
            return Err(ValidationError::InvalidVariant {
                field: "role",
                value: "system".to_owned(),
            });
        }
        if message.content.trim().is_empty() {
            return Err(ValidationError::Empty { field: "content" });
        }
        if message.content.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ValidationError::TooLong {
                field: "content",
                max: MAX_MESSAGE_CHARS,
            });
        }
    }

    if messages.last().map(|m| m.role) != Some(ChatRole::User) {
        return Err(ValidationError::InvalidFormat {
            field: "messages",
            reason: "last message must come from the user",
        });
    }

    Ok(())
}

/// Chat completion provider
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Reply to a validated conversation.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AssistantError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<&'a ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client
pub struct OpenAiChatClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    system_prompt: ChatMessage,
}

impl OpenAiChatClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AssistantError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            model: model.into(),
            system_prompt: ChatMessage {
                role: ChatRole::System,
                content: system_prompt.into(),
            },
        })
    }

    /// Build from config. `None` when no API key is set.
    pub fn from_config(config: &AssistantSection) -> Result<Option<Self>, AssistantError> {
        let Some(api_key) = config.api_key.as_deref().filter(|_| config.is_enabled()) else {
            return Ok(None);
        };

        Self::new(
            &config.base_url,
            api_key,
            &config.model,
            &config.system_prompt,
            Duration::from_secs(config.timeout_secs),
        )
        .map(Some)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatBackend for OpenAiChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AssistantError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: std::iter::once(&self.system_prompt).chain(messages).collect(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status,
                body = %truncate_chars(&body, LOG_BODY_CHARS),
                "assistant upstream error"
            );
            return Err(AssistantError::Upstream { status });
        }

        let data: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::InvalidResponse(e.to_string()))?;

        data.choices
            .into_iter()
            .find_map(|c| c.message.content.filter(|s| !s.trim().is_empty()))
            .ok_or_else(|| AssistantError::InvalidResponse("no reply in choices".into()))
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_owned(),
    }
}
