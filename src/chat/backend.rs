//! Core `ChatBackend` trait and `ApiChatBackend` implementation.
//!
//! `ApiChatBackend` calls any OpenAI-compatible `/v1/chat/completions`
//! endpoint — Ollama (OpenAI mode), OpenAI, Groq, LM Studio, vLLM, etc.
//! All connection details come from [`ChatConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ChatConfig;

// ---------------------------------------------------------------------------
// ChatError
// ---------------------------------------------------------------------------

/// Errors that can occur during a chat turn.
#[derive(Debug, Error)]
pub enum ChatError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("chat request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse chat response: {0}")]
    Parse(String),

    /// The model returned a response with no usable text content.
    #[error("chat backend returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for ChatError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ChatError::Timeout
        } else {
            ChatError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// ChatSession
// ---------------------------------------------------------------------------

/// One message of a chat session's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

/// Client-held chat history.
///
/// The wire protocol is stateless, so the session handle is nothing more
/// than the ordered message list resent with every turn.  Creating a new
/// session starts the conversation from scratch.
#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full conversation so far, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of turns recorded (user and assistant messages combined).
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }
}

// ---------------------------------------------------------------------------
// ChatBackend trait
// ---------------------------------------------------------------------------

/// Async trait for conversational backends.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn ChatBackend>`).
///
/// A successful `send` appends both the user message and the assistant
/// reply to `session`, so the history stays consistent with what the model
/// saw.  A failed `send` leaves the session unchanged.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, session: &mut ChatSession, text: &str) -> Result<String, ChatError>;
}

// ---------------------------------------------------------------------------
// ApiChatBackend
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// Works with: Ollama (OpenAI mode), OpenAI, Groq, Together.ai, LM Studio,
/// vLLM — any provider that speaks the OpenAI chat-completions wire format.
///
/// # No hardcoded URLs
/// All connection details (`base_url`, `api_key`, `model`) come exclusively
/// from the [`ChatConfig`] passed to [`ApiChatBackend::from_config`].
pub struct ApiChatBackend {
    client: reqwest::Client,
    config: ChatConfig,
}

impl ApiChatBackend {
    /// Build an `ApiChatBackend` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &ChatConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl ChatBackend for ApiChatBackend {
    /// Send `text` as the next user turn of `session`.
    ///
    /// The `Authorization: Bearer …` header is attached **only** when
    /// `config.api_key` is `Some(key)` and `key` is non-empty — safe for
    /// Ollama and other local providers that require no authentication.
    async fn send(&self, session: &mut ChatSession, text: &str) -> Result<String, ChatError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);

        // The history plus the new turn; nothing is committed to the
        // session until the request succeeds.
        let mut messages: Vec<ChatMessage> = session.messages().to_vec();
        messages.push(ChatMessage::user(text));

        let body = serde_json::json!({
            "model":       self.config.model,
            "messages":    messages,
            "stream":      false,
            "temperature": self.config.temperature,
        });

        let mut req = self.client.post(&url).json(&body);

        // Attach Authorization header only when api_key is a non-empty string.
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChatError::Parse(e.to_string()))?;

        let reply = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(ChatError::EmptyResponse)?
            .trim()
            .to_string();

        if reply.is_empty() {
            return Err(ChatError::EmptyResponse);
        }

        session.push(ChatMessage::user(text));
        session.push(ChatMessage::assistant(reply.clone()));

        Ok(reply)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
