//! Failure classification for backend errors.
//!
//! The backend signals failure with a rendered message, not typed codes.
//! Classification maps that text onto a closed set of outcomes the executor
//! acts on. The trait keeps the mapping pluggable: a backend with structured
//! error codes can implement the same contract precisely instead of relying
//! on substring matching.

use serde::{Deserialize, Serialize};

/// The closed set of failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Quota exhausted. Terminal: retrying would burn more quota.
    RateLimited,
    /// Worth retrying: timeouts, connection resets, 5xx-class failures.
    Transient,
    /// Everything else. Propagated to the caller, which may switch models.
    Fatal,
}

/// Maps a backend error message to a failure class.
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, message: &str) -> ErrorClass;
}

/// Default classifier: case-insensitive substring markers.
///
/// Rate-limit markers are checked first so that a message like
/// "429 gateway timeout" resolves as a quota problem, not a retryable one.
#[derive(Debug, Clone)]
pub struct SubstringClassifier {
    rate_limit_markers: Vec<&'static str>,
    transient_markers: Vec<&'static str>,
}

impl Default for SubstringClassifier {
    fn default() -> Self {
        Self {
            rate_limit_markers: vec!["429", "rate limit", "quota"],
            transient_markers: vec![
                "timeout",
                "timed out",
                "connection reset",
                "temporarily unavailable",
                "502",
                "503",
                "504",
            ],
        }
    }
}

impl ErrorClassifier for SubstringClassifier {
    fn classify(&self, message: &str) -> ErrorClass {
        let lower = message.to_lowercase();
        if self.rate_limit_markers.iter().any(|m| lower.contains(m)) {
            return ErrorClass::RateLimited;
        }
        if self.transient_markers.iter().any(|m| lower.contains(m)) {
            return ErrorClass::Transient;
        }
        ErrorClass::Fatal
    }
}
