//! Anthropic Messages API adapter.
//!
//! Ported from `aither-claude`, collapsed to the non-streaming, tool-free
//! shape the research core needs: one request, one complete text reply,
//! usage.

use std::sync::Arc;

use async_trait::async_trait;
use scry_core::llm::{Message, Role};
use scry_core::{LanguageModel, Result, ScryError, Usage};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Claude chat model client for the Anthropic Messages API.
#[derive(Clone)]
pub struct Claude {
    inner: Arc<Config>,
    http: reqwest::Client,
}

struct Config {
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl Claude {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::builder(api_key).build()
    }

    #[must_use]
    pub fn builder(api_key: impl Into<String>) -> Builder {
        Builder::new(api_key)
    }
}

/// Builder for [`Claude`] clients.
pub struct Builder {
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl Builder {
    fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
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
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn build(self) -> Claude {
        Claude {
            inner: Arc::new(Config {
                api_key: self.api_key,
                base_url: self.base_url,
                model: self.model,
                max_tokens: self.max_tokens,
            }),
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<MessagePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
}

#[derive(Serialize)]
struct MessagePayload {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: ResponseUsage,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct ResponseUsage {
    input_tokens: u64,
    output_tokens: u64,
}

fn to_claude_messages(messages: &[Message]) -> (Option<String>, Vec<MessagePayload>) {
    let mut system_parts = Vec::new();
    let mut payload = Vec::new();
    for m in messages {
        match m.role {
            Role::System => system_parts.push(m.content.clone()),
            Role::User => payload.push(MessagePayload { role: "user", content: m.content.clone() }),
            Role::Assistant => payload.push(MessagePayload { role: "assistant", content: m.content.clone() }),
        }
    }
    let system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));
    (system, payload)
}

#[async_trait]
impl LanguageModel for Claude {
    async fn respond(&self, messages: &[Message]) -> Result<(String, Usage)> {
        let cfg = &self.inner;
        let (system, claude_messages) = to_claude_messages(messages);

        let body = MessagesRequest {
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            messages: claude_messages,
            system,
            stream: false,
        };

        let endpoint = format!("{}/v1/messages", cfg.base_url.trim_end_matches('/'));
        tracing::debug!(model = %cfg.model, "sending Claude request");

        let response = self
            .http
            .post(endpoint)
            .header("x-api-key", &cfg.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::USER_AGENT, "scry-claude/0.1")
            .json(&body)
            .send()
            .await
            .map_err(|e| ScryError::TransientNetwork(e.into()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ScryError::Model(format!("Claude API returned {status}: {text}")));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ScryError::Model(format!("failed to parse Claude response: {e}")))?;

        let text = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        let usage = Usage {
            input_tokens: parsed.usage.input_tokens,
            output_tokens: parsed.usage.output_tokens,
        };

        Ok((text, usage))
    }
}
