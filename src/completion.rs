//! Remote chat-completion client
//!
//! Sends the conversation history to an OpenAI-compatible chat endpoint and
//! extracts the first assistant-authored reply. Every failure degrades to
//! "no reply": errors are logged, never propagated as a crash.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;

/// Who authored a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Seam for the remote completion service
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Request a reply for the conversation so far. The newest user
    /// utterance is the final message of `history`. Returns None on any
    /// failure or when the service produces no assistant reply.
    async fn complete(&self, history: &[ChatTurn]) -> Option<String>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    role: String,
    content: Option<String>,
}

/// HTTP client for the chat-completion service
#[derive(Clone)]
pub struct CompletionClient {
    client: reqwest::Client,
    url: String,
    model: String,
    max_tokens: u32,
    api_key: Option<String>,
}

impl CompletionClient {
    pub fn new(config: &Config, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.completion_url.trim_end_matches('/').to_string(),
            model: config.completion_model.clone(),
            max_tokens: config.max_tokens,
            api_key,
        }
    }
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    // One network call per invocation, no retry. No timeout either: a hung
    // service stalls the dialogue loop, which is accepted for this tool.
    async fn complete(&self, history: &[ChatTurn]) -> Option<String> {
        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.url))
            .json(&ChatCompletionRequest {
                model: &self.model,
                messages: history,
                max_tokens: self.max_tokens,
            });

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("❌ Completion request failed: {}", e);
                return None;
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                warn!("❌ Failed to read completion response: {}", e);
                return None;
            }
        };

        if !status.is_success() {
            warn!("❌ Completion API error ({}): {}", status, body);
            return None;
        }

        debug!("Completion raw body: {}", body);

        let parsed: ChatCompletionResponse = match serde_json::from_str(&body) {
            Ok(p) => p,
            Err(e) => {
                warn!("❌ Failed to deserialize completion response: {} - Body: {}", e, body);
                return None;
            }
        };

        first_assistant_reply(parsed)
    }
}

/// Select the first choice authored by the assistant role
fn first_assistant_reply(response: ChatCompletionResponse) -> Option<String> {
    for choice in response.choices {
        if choice.message.role == "assistant" {
            let content = choice.message.content.unwrap_or_default();
            let trimmed = content.trim();
            if trimmed.is_empty() {
                warn!("Assistant reply was empty");
                return None;
            }
            return Some(trimmed.to_string());
        }
    }

    warn!("No assistant reply in completion response");
    None
}
