//! Provider-agnostic language-model abstraction.
//!
//! [`LanguageModel`] is the single seam where provider differences live:
//! every `scry-provider-*` crate implements it once, and everything above
//! this module — gateway, evaluator, extractor, planner, report writer —
//! calls only through it.

pub mod message;
pub mod prompts;
pub mod recovery;
pub mod schema;

pub use message::{Message, Role};
pub use schema::OutputSchema;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ScryError};

/// Token accounting for one model call, mirroring the `{input_tokens,
/// output_tokens}` shape every provider's wire format actually returns.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// A non-streaming structured-output request: a system prompt, a user
/// prompt, and the dynamic schema constraining the reply.
#[derive(Debug, Clone)]
pub struct LLMRequest {
    pub messages: Vec<Message>,
    pub schema: OutputSchema,
}

impl LLMRequest {
    #[must_use]
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>, schema: OutputSchema) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::user(user_prompt)],
            schema,
        }
    }
}

/// The one trait every model provider implements.
///
/// `respond` returns raw assistant text plus usage; schema enforcement and
/// JSON recovery live in [`generate_structured`] above this trait so that
/// providers stay dumb wire adapters.
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    async fn respond(&self, messages: &[Message]) -> Result<(String, Usage)>;
}

#[async_trait::async_trait]
impl<T: LanguageModel + ?Sized> LanguageModel for std::sync::Arc<T> {
    async fn respond(&self, messages: &[Message]) -> Result<(String, Usage)> {
        (**self).respond(messages).await
    }
}

/// Issues `request` against `model`, injecting the schema-instruction system
/// prompt, and parses the reply through the JSON-recovery chain. Returns the
/// parsed dynamic value alongside usage; callers narrow the value through
/// field access rather than a generated Rust type, since the schema is
/// chosen per call at runtime.
///
/// The reply is validated against `request.schema` after JSON parsing: a
/// syntactically valid but structurally wrong reply (missing required
/// field, wrong type) fails with [`ScryError::Model`] rather than passing
/// through as an untyped value.
pub async fn generate_structured<M: LanguageModel + ?Sized>(
    model: &M,
    request: LLMRequest,
) -> Result<(Value, Usage)> {
    let schema = request.schema.json_schema();
    let schema_text = serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string());
    let instruction = prompts::generate(&schema_text);

    let mut messages = request.messages;
    messages.push(Message::system(instruction));

    let (text, usage) = model.respond(&messages).await?;
    let value = recovery::parse_json_with_recovery(&text)?;
    validate_against_schema(&schema, &value)?;
    Ok((value, usage))
}

/// Validates `value` against the compiled JSON Schema document, returning a
/// [`ScryError::Model`] naming the first violation on failure.
fn validate_against_schema(schema: &Value, value: &Value) -> Result<()> {
    let compiled = jsonschema::JSONSchema::compile(schema)
        .map_err(|e| ScryError::Model(format!("internal schema document is invalid: {e}")))?;
    if let Err(mut errors) = compiled.validate(value) {
        let first = errors.next().map(|e| e.to_string()).unwrap_or_else(|| "schema validation failed".to_string());
        return Err(ScryError::Model(format!("model output failed schema validation: {first}")));
    }
    Ok(())
}
