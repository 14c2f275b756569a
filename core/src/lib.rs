//! Provider-agnostic primitives shared by every `scry-*` crate: the
//! [`llm::LanguageModel`] trait, dynamic schema descriptors, the error
//! taxonomy, the budget accountant, and the concurrency governor.

pub mod budget;
pub mod error;
pub mod governor;
pub mod llm;

pub use budget::{BudgetAccountant, BudgetSnapshot};
pub use error::{ErrorKind, Result, ScryError};
pub use governor::Governor;
pub use llm::{generate_structured, LLMRequest, LanguageModel, Message, OutputSchema, Role, Usage};
