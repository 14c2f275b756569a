//! The closed provider-dispatch enum.

use async_trait::async_trait;
use scry_core::llm::Message;
use scry_core::{ErrorKind, LanguageModel, Result, ScryError, Usage};
use scry_provider_claude::Claude;
use scry_provider_gemini::Gemini;
use scry_provider_openai::OpenAi;
use scry_provider_xai::Xai;

/// Credentials for every provider namespace the gateway recognizes. Absence
/// of the field for the *requested* provider is a fatal [`ScryError::
/// Config`], raised before any network call.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub xai_api_key: Option<String>,
}

/// A parsed `provider:modelId` identifier.
#[derive(Debug, Clone)]
pub struct ModelId {
    pub provider: Provider,
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAi,
    Google,
    Xai,
}

impl ModelId {
    /// Parses `"provider:modelId"`. Returns a [`ScryError::Config`] for
    /// malformed ids or unrecognized provider namespaces.
    pub fn parse(raw: &str) -> Result<Self> {
        let (provider_str, model) = raw
            .split_once(':')
            .ok_or_else(|| ScryError::Config(format!("malformed model id (expected provider:modelId): {raw}")))?;
        let provider = match provider_str {
            "anthropic" => Provider::Anthropic,
            "openai" => Provider::OpenAi,
            "google" => Provider::Google,
            "xai" => Provider::Xai,
            other => return Err(ScryError::Config(format!("unrecognized model provider: {other}"))),
        };
        if model.trim().is_empty() {
            return Err(ScryError::Config(format!("malformed model id (empty model segment): {raw}")));
        }
        Ok(Self { provider, model: model.to_string() })
    }
}

/// The closed tagged variant over every supported provider. This is the
/// only place provider differences live above `scry-core`.
pub enum AnyModel {
    Anthropic(Claude),
    OpenAi(OpenAi),
    Google(Gemini),
    Xai(Xai),
}

impl AnyModel {
    /// Resolves `id` against `credentials`, building the concrete provider
    /// client. Fails fatally if the requested provider's credential is
    /// missing.
    pub fn resolve(id: &ModelId, credentials: &Credentials) -> Result<Self> {
        Ok(match id.provider {
            Provider::Anthropic => {
                let key = credentials.anthropic_api_key.clone().ok_or_else(|| {
                    ScryError::Config("missing ANTHROPIC_API_KEY for requested anthropic:* model".to_string())
                })?;
                Self::Anthropic(Claude::builder(key).model(&id.model).build())
            }
            Provider::OpenAi => {
                let key = credentials.openai_api_key.clone().ok_or_else(|| {
                    ScryError::Config("missing OPENAI_API_KEY for requested openai:* model".to_string())
                })?;
                Self::OpenAi(OpenAi::builder(key).model(&id.model).build())
            }
            Provider::Google => {
                let key = credentials.google_api_key.clone().ok_or_else(|| {
                    ScryError::Config("missing GOOGLE_API_KEY for requested google:* model".to_string())
                })?;
                Self::Google(Gemini::builder(key).model(&id.model).build())
            }
            Provider::Xai => {
                let key = credentials
                    .xai_api_key
                    .clone()
                    .ok_or_else(|| ScryError::Config("missing XAI_API_KEY for requested xai:* model".to_string()))?;
                Self::Xai(Xai::with_model(key, &id.model))
            }
        })
    }
}

#[async_trait]
impl LanguageModel for AnyModel {
    async fn respond(&self, messages: &[Message]) -> Result<(String, Usage)> {
        match self {
            Self::Anthropic(m) => m.respond(messages).await,
            Self::OpenAi(m) => m.respond(messages).await,
            Self::Google(m) => m.respond(messages).await,
            Self::Xai(m) => m.respond(messages).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_model_id() {
        let id = ModelId::parse("anthropic:claude-sonnet-4-5").unwrap();
        assert_eq!(id.provider, Provider::Anthropic);
        assert_eq!(id.model, "claude-sonnet-4-5");
    }

    #[test]
    fn rejects_missing_colon() {
        assert!(ModelId::parse("claude-sonnet-4-5").is_err());
    }

    #[test]
    fn rejects_unknown_provider() {
        assert!(ModelId::parse("unknown:foo").is_err());
    }

    #[test]
    fn missing_credential_is_fatal_config_error() {
        let id = ModelId::parse("openai:gpt-4.1").unwrap();
        let err = AnyModel::resolve(&id, &Credentials::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
