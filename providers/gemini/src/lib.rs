//! Google Gemini `generateContent` adapter.
//!
//! Ported from `aither-gemini`'s wire types
//! (`GeminiContent`/`Candidate`/`systemInstruction`), collapsed to one
//! non-streaming call against `:generateContent`.

use std::sync::Arc;

use async_trait::async_trait;
use scry_core::llm::{Message, Role};
use scry_core::{LanguageModel, Result, ScryError, Usage};
use serde::{Deserialize, Serialize};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-pro";

#[derive(Clone)]
pub struct Gemini {
    inner: Arc<Config>,
    http: reqwest::Client,
}

struct Config {
    api_key: String,
    base_url: String,
    model: String,
}

impl Gemini {
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
        Self { api_key: api_key.into(), base_url: GEMINI_BASE_URL.to_string(), model: DEFAULT_MODEL.to_string() }
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = sanitize_model(model);
        self
    }

    #[must_use]
    pub fn build(self) -> Gemini {
        Gemini {
            inner: Arc::new(Config { api_key: self.api_key, base_url: self.base_url, model: self.model }),
            http: reqwest::Client::new(),
        }
    }
}

fn sanitize_model(model: impl Into<String>) -> String {
    let model = model.into();
    model.strip_prefix("models/").map(str::to_string).unwrap_or(model)
}

#[derive(Serialize)]
struct GenerateContentRequest {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize, Default)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u64,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u64,
}

fn to_gemini_contents(messages: &[Message]) -> (Option<GeminiContent>, Vec<GeminiContent>) {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();
    for m in messages {
        match m.role {
            Role::System => system_parts.push(Part { text: m.content.clone() }),
            Role::User => contents.push(GeminiContent { role: Some("user".to_string()), parts: vec![Part { text: m.content.clone() }] }),
            Role::Assistant => contents.push(GeminiContent { role: Some("model".to_string()), parts: vec![Part { text: m.content.clone() }] }),
        }
    }
    let system = (!system_parts.is_empty()).then(|| GeminiContent { role: None, parts: system_parts });
    (system, contents)
}

#[async_trait]
impl LanguageModel for Gemini {
    async fn respond(&self, messages: &[Message]) -> Result<(String, Usage)> {
        let cfg = &self.inner;
        let (system_instruction, contents) = to_gemini_contents(messages);
        let body = GenerateContentRequest { system_instruction, contents };

        let endpoint = format!(
            "{}/models/{}:generateContent",
            cfg.base_url.trim_end_matches('/'),
            cfg.model
        );
        tracing::debug!(model = %cfg.model, "sending Gemini request");

        let response = self
            .http
            .post(endpoint)
            .header("x-goog-api-key", &cfg.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScryError::TransientNetwork(e.into()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ScryError::Model(format!("Gemini API returned {status}: {text}")));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ScryError::Model(format!("failed to parse Gemini response: {e}")))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().map(|p| p.text).collect::<Vec<_>>().join(""))
            .ok_or_else(|| ScryError::Model("Gemini response had no candidates".to_string()))?;

        let usage_metadata = parsed.usage_metadata.unwrap_or_default();
        let usage = Usage {
            input_tokens: usage_metadata.prompt_token_count,
            output_tokens: usage_metadata.candidates_token_count,
        };

        Ok((text, usage))
    }
}
