//! Primary → fallback orchestration.
//!
//! The executor signals "switch models" by returning the raw backend error.
//! This pipeline catches that, runs exactly one more independent execution
//! under the fallback configuration against the same assembled payload, and
//! never lets a failure escape as a panic or error: the worst case is a
//! terminal `error` outcome embedding both failure messages.
//!
//! Rate-limited results are ordinary outcomes, not failures; they do not
//! trigger the fallback (a second model behind the same quota would fail
//! the same way).

use crate::executor::CompletionExecutor;
use crate::report::{CompletionAttempt, RunStatus};
use hindsight_core::backend::{CompletionRequest, UsageSummary};
use tracing::warn;

/// What the orchestration produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub attempt: CompletionAttempt,
    /// The primary failure message, set when the fallback path ran.
    pub fallback_reason: Option<String>,
}

/// Run the primary request, falling back once on a fatal error.
pub async fn run_with_fallback(
    executor: &CompletionExecutor,
    primary: &CompletionRequest,
    fallback: &CompletionRequest,
) -> PipelineOutcome {
    let primary_err = match executor.execute(primary).await {
        Ok(attempt) => {
            return PipelineOutcome {
                attempt,
                fallback_reason: None,
            }
        }
        Err(err) => err,
    };

    warn!(
        error = %primary_err,
        fallback_model = %fallback.primary.model,
        "Primary model failed; trying fallback"
    );

    match executor.execute(fallback).await {
        Ok(attempt) => PipelineOutcome {
            attempt,
            fallback_reason: Some(primary_err.message),
        },
        Err(fallback_err) => PipelineOutcome {
            attempt: CompletionAttempt {
                response: format!(
                    "Error: could not process the request. Primary: {}. Fallback: {}",
                    primary_err.message, fallback_err.message
                ),
                status: RunStatus::Error,
                model_used: fallback.primary.model.clone(),
                sub_model_used: None,
                attempts: 0,
                execution_time_secs: 0.0,
                usage: UsageSummary::default(),
                cost_estimate: None,
                backoff_secs: Vec::new(),
            },
            fallback_reason: Some(primary_err.message),
        },
    }
}
