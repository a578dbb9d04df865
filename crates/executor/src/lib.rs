//! # Hindsight Executor
//!
//! The resilient completion protocol: one executor call drives a request to
//! a terminal state (success, rate-limited, or fatal) with linear-backoff
//! retries for transient failures, and the pipeline wraps that in a single
//! fallback-model attempt.

pub mod executor;
pub mod pipeline;
pub mod remote;
pub mod report;

pub use executor::{CompletionExecutor, ExecutorConfig, RATE_LIMIT_MESSAGE};
pub use pipeline::{run_with_fallback, PipelineOutcome};
pub use remote::{RemoteBackend, RemoteBackendFactory};
pub use report::{CompletionAttempt, RunStatus};
