//! The error taxonomy shared by every `scry-*` crate.
//!
//! One variant per error kind in the governing specification's error table.
//! Call sites match on [`ScryError::kind`] rather than `Display` text so that
//! orchestration code (swallow vs. propagate, §7) stays decoupled from
//! message wording.

use std::fmt;

/// Coarse error classification, independent of the underlying cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing credential for the requested provider, or a malformed model id. Fatal.
    Config,
    /// HTTP failure in a search or fetch call. Locally swallowed by the caller.
    TransientNetwork,
    /// A gateway call failed outright or violated its schema.
    Model,
    /// A per-operation deadline was exceeded.
    Timeout,
    /// The budget accountant's `reached` flag flipped true.
    BudgetReached,
}

/// Unified error type returned by gateway, search, fetch and research-core operations.
#[derive(Debug, thiserror::Error)]
pub enum ScryError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("transient network error: {0}")]
    TransientNetwork(#[source] anyhow::Error),

    #[error("model error: {0}")]
    Model(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("token budget reached")]
    BudgetReached,
}

impl ScryError {
    /// Returns the coarse kind for this error, used to decide swallow-vs-propagate policy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::TransientNetwork(_) => ErrorKind::TransientNetwork,
            Self::Model(_) => ErrorKind::Model,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::BudgetReached => ErrorKind::BudgetReached,
        }
    }

    /// True for errors that a research node should log and continue past
    /// rather than abort the whole invocation over.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Config)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Config => "config",
            Self::TransientNetwork => "transient_network",
            Self::Model => "model",
            Self::Timeout => "timeout",
            Self::BudgetReached => "budget_reached",
        };
        f.write_str(s)
    }
}

pub type Result<T> = std::result::Result<T, ScryError>;
