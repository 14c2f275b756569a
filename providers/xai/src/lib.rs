//! xAI Grok adapter.
//!
//! xAI's API is OpenAI-compatible (`/v1/chat/completions`), so this crate is
//! a thin relabeling of [`scry_provider_openai::OpenAi`] pointed at xAI's
//! base URL rather than a second wire-format implementation — noted in
//! DESIGN.md as a deliberate simplification, not a missing feature.

use async_trait::async_trait;
use scry_core::llm::Message;
use scry_core::{LanguageModel, Result, Usage};
use scry_provider_openai::OpenAi;

pub const XAI_BASE_URL: &str = "https://api.x.ai/v1";
const DEFAULT_MODEL: &str = "grok-4";

#[derive(Clone)]
pub struct Xai {
    inner: OpenAi,
}

impl Xai {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { inner: OpenAi::builder(api_key).base_url(XAI_BASE_URL).model(DEFAULT_MODEL).build() }
    }

    #[must_use]
    pub fn with_model(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self { inner: OpenAi::builder(api_key).base_url(XAI_BASE_URL).model(model).build() }
    }
}

#[async_trait]
impl LanguageModel for Xai {
    async fn respond(&self, messages: &[Message]) -> Result<(String, Usage)> {
        self.inner.respond(messages).await
    }
}
