//! Per-attempt result types.

use hindsight_core::backend::UsageSummary;
use hindsight_telemetry::CostEstimate;
use serde::{Deserialize, Serialize};

/// Terminal status of a completion attempt or a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Ok,
    /// Quota exhausted; the response carries an advisory message.
    RateLimited,
    /// Not enough context existed to bother the backend.
    Skipped,
    /// Both the primary and the fallback model failed.
    Error,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::RateLimited => write!(f, "rate_limited"),
            Self::Skipped => write!(f, "skipped"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// The immutable result of one executor call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionAttempt {
    pub response: String,
    pub status: RunStatus,
    pub model_used: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_model_used: Option<String>,
    /// 1-based count of backend calls this executor call made.
    pub attempts: u32,
    pub execution_time_secs: f64,
    pub usage: UsageSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_estimate: Option<CostEstimate>,
    /// Backoff sleeps performed before retries, in order, in seconds.
    pub backoff_secs: Vec<f64>,
}
