//! The Model Gateway: `generateStructured(schema, systemPrompt, userPrompt,
//! options) -> (object, usage)`, provider-agnostic and dispatched by a
//! `provider:modelId` string with a configured default.

pub mod model;
pub mod trim;

pub use model::{AnyModel, Credentials, ModelId, Provider};
pub use trim::{estimate_tokens, trim_to_tokens};

use scry_core::{generate_structured, LLMRequest, OutputSchema, Result, Usage};
use serde_json::Value;

/// Owns the resolved default model id and the credential set; every call
/// site supplies an optional override id and falls back to this default.
pub struct Gateway {
    credentials: Credentials,
    default_model: String,
}

impl Gateway {
    #[must_use]
    pub fn new(credentials: Credentials, default_model: impl Into<String>) -> Self {
        Self { credentials, default_model: default_model.into() }
    }
}

/// The call shape orchestration code depends on, independent of how the
/// reply is actually produced. `Gateway` resolves a real provider through
/// credentials; tests substitute a mock built directly over a
/// [`scry_core::LanguageModel`] stub, skipping credential resolution
/// entirely.
#[async_trait::async_trait]
pub trait GatewayLike: Send + Sync {
    async fn generate_structured(
        &self,
        model_override: Option<&str>,
        system_prompt: &str,
        user_prompt: &str,
        schema: OutputSchema,
    ) -> Result<(Value, Usage)>;
}

#[async_trait::async_trait]
impl GatewayLike for Gateway {
    /// Resolves `model_override` (or the configured default) against
    /// credentials, issues the structured-output call, and returns the
    /// parsed dynamic value plus usage.
    async fn generate_structured(
        &self,
        model_override: Option<&str>,
        system_prompt: &str,
        user_prompt: &str,
        schema: OutputSchema,
    ) -> Result<(Value, Usage)> {
        let raw_id = model_override.unwrap_or(&self.default_model);
        let id = ModelId::parse(raw_id)?;
        let model = AnyModel::resolve(&id, &self.credentials)?;
        let request = LLMRequest::new(system_prompt.to_string(), user_prompt.to_string(), schema);
        generate_structured(&model, request).await
    }
}
