//! OpenAI chat-completions adapter.
//!
//! Ported from `aither-openai`, collapsed to a single non-streaming call:
//! build a `messages` array directly (no attachments, no tool calls),
//! POST `/chat/completions`, read back one choice.

use std::sync::Arc;

use async_trait::async_trait;
use scry_core::llm::{Message, Role};
use scry_core::{LanguageModel, Result, ScryError, Usage};
use serde::{Deserialize, Serialize};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4.1";

/// `OpenAI`-compatible chat model client (also usable against any
/// `/chat/completions`-compatible base URL, e.g. OpenRouter/Deepseek).
#[derive(Clone)]
pub struct OpenAi {
    inner: Arc<Config>,
    http: reqwest::Client,
}

struct Config {
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAi {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::builder(api_key).build()
    }

    #[must_use]
    pub fn builder(api_key: impl Into<String>) -> Builder {
        Builder::new(api_key)
    }
}

pub struct Builder {
    api_key: String,
    base_url: String,
    model: String,
}

impl Builder {
    fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), base_url: OPENAI_BASE_URL.to_string(), model: DEFAULT_MODEL.to_string() }
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into().trim().to_string();
        self
    }

    #[must_use]
    pub fn build(self) -> OpenAi {
        OpenAi {
            inner: Arc::new(Config { api_key: self.api_key, base_url: self.base_url, model: self.model }),
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<ResponseUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ResponseUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

fn to_chat_messages(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|m| ChatMessage {
            role: match m.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: m.content.clone(),
        })
        .collect()
}

#[async_trait]
impl LanguageModel for OpenAi {
    async fn respond(&self, messages: &[Message]) -> Result<(String, Usage)> {
        let cfg = &self.inner;
        let body = ChatRequest { model: cfg.model.clone(), messages: to_chat_messages(messages) };

        let endpoint = format!("{}/chat/completions", cfg.base_url.trim_end_matches('/'));
        tracing::debug!(model = %cfg.model, "sending OpenAI request");

        let response = self
            .http
            .post(endpoint)
            .bearer_auth(&cfg.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScryError::TransientNetwork(e.into()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ScryError::Model(format!("OpenAI API returned {status}: {text}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ScryError::Model(format!("failed to parse OpenAI response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ScryError::Model("OpenAI response had no choices".to_string()))?;

        let usage = parsed
            .usage
            .map(|u| Usage { input_tokens: u.prompt_tokens, output_tokens: u.completion_tokens })
            .unwrap_or_default();

        Ok((text, usage))
    }
}
