//! The completion executor: one call, driven to a terminal state.
//!
//! Per top-level call the state machine is
//! `Attempting → {Success, RateLimited, RetryScheduled, Failed}`:
//!
//! - Success returns an immutable [`CompletionAttempt`] with usage and the
//!   cost estimate filled in.
//! - A rate-limited failure is terminal immediately: retrying would burn
//!   more of a quota that is already gone. The raw error is replaced by a
//!   friendly advisory message.
//! - A transient failure schedules a retry while attempts remain, sleeping
//!   `backoff_base × attempt` (linear). Every retry builds a fresh backend
//!   through the factory; connection state from a failed attempt is never
//!   reused. Sleeps are recorded on the result, so tests can assert them
//!   exactly.
//! - Everything else, including exhausted retries, is returned as the raw
//!   [`BackendError`]: the explicit signal the pipeline uses to trigger a
//!   fallback-model attempt.

use crate::report::{CompletionAttempt, RunStatus};
use hindsight_core::backend::{BackendFactory, CompletionRequest, UsageSummary};
use hindsight_core::classify::{ErrorClass, ErrorClassifier};
use hindsight_core::error::BackendError;
use hindsight_telemetry::CostEstimator;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Advisory message substituted for a raw rate-limit error.
pub const RATE_LIMIT_MESSAGE: &str =
    "The provider's quota has been reached. Please try again in a few minutes.";

/// Retry tuning.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    /// Retries after the first attempt, for transient failures only.
    pub max_retries: u32,
    /// Attempt N sleeps `backoff_base × N` before the next try.
    pub backoff_base: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base: Duration::from_secs(2),
        }
    }
}

/// Issues completion requests with retry and rate-limit handling.
pub struct CompletionExecutor {
    factory: Arc<dyn BackendFactory>,
    classifier: Arc<dyn ErrorClassifier>,
    estimator: Arc<CostEstimator>,
    config: ExecutorConfig,
}

impl CompletionExecutor {
    pub fn new(
        factory: Arc<dyn BackendFactory>,
        classifier: Arc<dyn ErrorClassifier>,
        estimator: Arc<CostEstimator>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            factory,
            classifier,
            estimator,
            config,
        }
    }

    /// Drive one request to a terminal state.
    pub async fn execute(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionAttempt, BackendError> {
        let mut attempt: u32 = 0;
        let mut backoff_secs: Vec<f64> = Vec::new();

        loop {
            attempt += 1;
            let backend = self.factory.build();
            debug!(
                backend = backend.name(),
                model = %request.primary.model,
                attempt,
                "Sending completion request"
            );

            let err = match backend.complete(request).await {
                Ok(outcome) => {
                    let cost = self.estimator.estimate(&outcome.usage);
                    return Ok(CompletionAttempt {
                        response: outcome.response,
                        status: RunStatus::Ok,
                        model_used: request.primary.model.clone(),
                        sub_model_used: request.secondary.as_ref().map(|c| c.model.clone()),
                        attempts: attempt,
                        execution_time_secs: outcome.execution_time.as_secs_f64(),
                        usage: outcome.usage,
                        cost_estimate: Some(cost),
                        backoff_secs,
                    });
                }
                Err(err) => err,
            };

            match self.classifier.classify(&err.message) {
                ErrorClass::RateLimited => {
                    warn!(error = %err, "Rate limited; giving up without retry");
                    return Ok(CompletionAttempt {
                        response: RATE_LIMIT_MESSAGE.into(),
                        status: RunStatus::RateLimited,
                        model_used: request.primary.model.clone(),
                        sub_model_used: request.secondary.as_ref().map(|c| c.model.clone()),
                        attempts: attempt,
                        execution_time_secs: 0.0,
                        usage: UsageSummary::default(),
                        cost_estimate: None,
                        backoff_secs,
                    });
                }
                ErrorClass::Transient if attempt <= self.config.max_retries => {
                    let delay = self.config.backoff_base * attempt;
                    warn!(
                        error = %err,
                        attempt,
                        delay_secs = delay.as_secs_f64(),
                        "Transient failure; retrying after backoff"
                    );
                    backoff_secs.push(delay.as_secs_f64());
                    tokio::time::sleep(delay).await;
                }
                _ => {
                    warn!(error = %err, attempt, "Fatal failure; escalating to caller");
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hindsight_core::backend::{
        CompletionBackend, CompletionOutcome, ModelConfig, SUB_MODEL_MAX_DEPTH,
    };
    use hindsight_core::classify::SubstringClassifier;
    use hindsight_core::context::ContextPayload;
    use std::sync::Mutex;

    /// Fails `failures` times with the given message, then succeeds.
    struct FlakyBackend {
        message: String,
        failures: Mutex<u32>,
    }

    #[async_trait]
    impl CompletionBackend for FlakyBackend {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionOutcome, BackendError> {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(BackendError::new(self.message.clone()));
            }
            let mut usage = UsageSummary::default();
            usage.record(request.primary.model.clone(), 2000, 1000);
            Ok(CompletionOutcome {
                response: "OK".into(),
                execution_time: Duration::from_millis(500),
                usage,
            })
        }
    }

    /// Builds FlakyBackends sharing a failure budget across rebuilds.
    struct FlakyFactory {
        message: String,
        remaining_failures: Arc<Mutex<u32>>,
        builds: Arc<Mutex<u32>>,
    }

    impl FlakyFactory {
        fn new(message: &str, failures: u32) -> Self {
            Self {
                message: message.into(),
                remaining_failures: Arc::new(Mutex::new(failures)),
                builds: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl BackendFactory for FlakyFactory {
        fn build(&self) -> Arc<dyn CompletionBackend> {
            *self.builds.lock().unwrap() += 1;
            // Each build gets the *shared* remaining-failure budget: one
            // failure per attempt until the budget runs out.
            let failures = {
                let mut remaining = self.remaining_failures.lock().unwrap();
                if *remaining > 0 {
                    *remaining -= 1;
                    1
                } else {
                    0
                }
            };
            Arc::new(FlakyBackend {
                message: self.message.clone(),
                failures: Mutex::new(failures),
            })
        }
    }

    fn executor_with(factory: Arc<dyn BackendFactory>, config: ExecutorConfig) -> CompletionExecutor {
        CompletionExecutor::new(
            factory,
            Arc::new(SubstringClassifier::default()),
            Arc::new(CostEstimator::with_defaults()),
            config,
        )
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new(
            "What did we do yesterday?",
            ContextPayload::Text("the context".into()),
            ModelConfig::new("kimi-k2.5", "https://api.moonshot.ai/v1", "sk-test"),
        )
        .with_secondary(Some(ModelConfig::new(
            "kimi-k2-turbo-preview",
            "https://api.moonshot.ai/v1",
            "sk-test",
        )))
    }

    fn fast_config(max_retries: u32) -> ExecutorConfig {
        ExecutorConfig {
            max_retries,
            backoff_base: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn success_carries_usage_and_cost() {
        let factory = Arc::new(FlakyFactory::new("unused", 0));
        let executor = executor_with(factory, fast_config(2));

        let attempt = executor.execute(&request()).await.unwrap();
        assert_eq!(attempt.status, RunStatus::Ok);
        assert_eq!(attempt.response, "OK");
        assert_eq!(attempt.attempts, 1);
        assert_eq!(attempt.model_used, "kimi-k2.5");
        assert_eq!(attempt.sub_model_used.as_deref(), Some("kimi-k2-turbo-preview"));
        assert!(attempt.backoff_secs.is_empty());
        // 2000 in + 1000 out on kimi-k2.5 at $0.60/$3.00 per M.
        let cost = attempt.cost_estimate.unwrap();
        assert!((cost.total_estimated_usd - 0.0042).abs() < 1e-10);
    }

    #[tokio::test]
    async fn rate_limit_is_terminal_without_sleep() {
        let factory = Arc::new(FlakyFactory::new("Error 429: rate limit exceeded", 10));
        let executor = executor_with(factory, fast_config(5));

        let attempt = executor.execute(&request()).await.unwrap();
        assert_eq!(attempt.status, RunStatus::RateLimited);
        assert_eq!(attempt.attempts, 1);
        assert!(attempt.backoff_secs.is_empty());
        assert_eq!(attempt.response, RATE_LIMIT_MESSAGE);
        assert!(attempt.usage.is_empty());
    }

    #[tokio::test]
    async fn transient_failure_retries_then_succeeds() {
        let factory = Arc::new(FlakyFactory::new("Connection timeout", 1));
        let builds = Arc::clone(&factory.builds);
        let executor = executor_with(factory, fast_config(1));

        let attempt = executor.execute(&request()).await.unwrap();
        assert_eq!(attempt.status, RunStatus::Ok);
        assert_eq!(attempt.attempts, 2);
        // One sleep, proportional to the attempt number: base × 1.
        assert_eq!(attempt.backoff_secs, vec![0.01]);
        // The backend was reconstructed for the retry.
        assert_eq!(*builds.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn backoff_is_linear_in_attempt_number() {
        let factory = Arc::new(FlakyFactory::new("HTTP 503: service unavailable", 3));
        let executor = executor_with(factory, fast_config(3));

        let attempt = executor.execute(&request()).await.unwrap();
        assert_eq!(attempt.attempts, 4);
        assert_eq!(attempt.backoff_secs, vec![0.01, 0.02, 0.03]);
    }

    #[tokio::test]
    async fn fatal_error_propagates_unchanged() {
        let factory = Arc::new(FlakyFactory::new("Model unavailable", 10));
        let executor = executor_with(factory, fast_config(0));

        let err = executor.execute(&request()).await.unwrap_err();
        assert_eq!(err.message, "Model unavailable");
    }

    #[tokio::test]
    async fn exhausted_transient_retries_escalate() {
        let factory = Arc::new(FlakyFactory::new("Connection timeout", 10));
        let executor = executor_with(factory, fast_config(2));

        let err = executor.execute(&request()).await.unwrap_err();
        assert_eq!(err.message, "Connection timeout");
    }

    #[test]
    fn request_sub_model_depth_is_fixed() {
        assert_eq!(request().max_depth, SUB_MODEL_MAX_DEPTH);
    }
}
