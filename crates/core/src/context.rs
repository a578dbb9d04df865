//! Context payload and budget types shared by the assembler and executor.

use serde::{Deserialize, Serialize};

/// Default character budget for one assembled context (~500K tokens, safe
/// for an 8 GB host).
pub const MAX_CHARS_DEFAULT: usize = 2_000_000;

/// Default number of sessions to include.
pub const MAX_SESSIONS_DEFAULT: usize = 30;

/// Character budget for one assembled context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBudget {
    /// Hard cap on emitted characters across all payload parts.
    pub max_chars: usize,
    /// Maximum number of sessions to include.
    pub max_sessions: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            max_chars: MAX_CHARS_DEFAULT,
            max_sessions: MAX_SESSIONS_DEFAULT,
        }
    }
}

/// Requested assembly mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextMode {
    /// One bounded string.
    Text,
    /// An ordered list of bounded chunks the backend can process one at a
    /// time instead of a single oversized prompt.
    Chunks,
    /// Resolve to `Chunks` under a constrained resource profile or when the
    /// unbounded size crosses a threshold, else `Text`.
    Auto,
}

impl std::fmt::Display for ContextMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Chunks => write!(f, "chunks"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// The assembled context, consumed uniformly by the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextPayload {
    Text(String),
    Chunks(Vec<String>),
}

impl ContextPayload {
    /// Total characters across all parts.
    pub fn char_count(&self) -> usize {
        match self {
            Self::Text(s) => s.chars().count(),
            Self::Chunks(chunks) => chunks.iter().map(|c| c.chars().count()).sum(),
        }
    }

    /// The mode this payload resolved to.
    pub fn resolved_mode(&self) -> ContextMode {
        match self {
            Self::Text(_) => ContextMode::Text,
            Self::Chunks(_) => ContextMode::Chunks,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Chunks(chunks) => chunks.iter().all(|c| c.is_empty()),
        }
    }
}
