//! Error types for the hindsight domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Data-quality problems
//! (a malformed transcript line, an unreadable note file) are never errors
//! at all: the components that touch them skip and move on. What remains is
//! the backend, serialization, and genuine internal failures.

use thiserror::Error;

/// The top-level error type for hindsight operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// An error raised by the completion backend.
///
/// Carries only a human-readable message. The backend contract is string
/// based: classification into rate-limited / transient / fatal happens by
/// inspecting this text (see [`crate::classify`]), so backends that do have
/// structured status codes embed them in the message.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_displays_message_verbatim() {
        let err = BackendError::new("HTTP 503: service unavailable");
        assert_eq!(err.to_string(), "HTTP 503: service unavailable");
    }

    #[test]
    fn top_level_error_wraps_backend_error() {
        let err = Error::from(BackendError::new("Connection timeout"));
        assert!(err.to_string().contains("Connection timeout"));
    }
}
