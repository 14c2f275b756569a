//! Chat message types shared by every provider adapter.

use serde::{Deserialize, Serialize};

/// Speaker role of a [`Message`], matching the roles every chat-completions
/// style API recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One turn in a conversation sent to a [`super::LanguageModel`].
///
/// The research core only ever needs plain text turns — no attachments, no
/// tool calls — so this stays a flat struct rather than a per-role enum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}
