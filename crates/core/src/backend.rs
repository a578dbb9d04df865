//! CompletionBackend trait — the abstraction over the remote completion
//! service.
//!
//! A backend takes an assembled context payload plus a query and returns the
//! response text with a usage summary, or fails with a [`BackendError`]
//! whose rendered message is the sole classification signal.

use crate::context::ContextPayload;
use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Sub-model recursion is restricted to one level. The wrapped service
/// documents deeper nesting as unimplemented, so the knob stays a fixed
/// constant rather than a tunable parameter.
pub const SUB_MODEL_MAX_DEPTH: u32 = 1;

/// Connection settings for one model endpoint.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: String,
}

impl ModelConfig {
    pub fn new(
        model: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// One completion request against the backend.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// The user's question, passed to the root model.
    pub query: String,
    /// The assembled historical context.
    pub context: ContextPayload,
    /// The primary (root) model.
    pub primary: ModelConfig,
    /// Secondary model for auxiliary sub-tasks. Only set when distinct from
    /// the primary; [`CompletionRequest::with_secondary`] enforces this.
    pub secondary: Option<ModelConfig>,
    pub max_iterations: u32,
    /// Always [`SUB_MODEL_MAX_DEPTH`].
    pub max_depth: u32,
    pub compaction: bool,
    pub compaction_threshold: f32,
    pub timeout: Duration,
}

impl CompletionRequest {
    pub fn new(query: impl Into<String>, context: ContextPayload, primary: ModelConfig) -> Self {
        Self {
            query: query.into(),
            context,
            primary,
            secondary: None,
            max_iterations: 20,
            max_depth: SUB_MODEL_MAX_DEPTH,
            compaction: false,
            compaction_threshold: 0.8,
            timeout: Duration::from_secs(120),
        }
    }

    /// Attach a secondary (sub) model. Dropped when it names the same model
    /// as the primary: the backend would gain nothing from a duplicate tier.
    pub fn with_secondary(mut self, secondary: Option<ModelConfig>) -> Self {
        self.secondary = secondary.filter(|s| s.model != self.primary.model);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_compaction(mut self, enabled: bool, threshold: f32) -> Self {
        self.compaction = enabled;
        self.compaction_threshold = threshold;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Token usage for one model, as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelUsage {
    pub total_calls: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Usage across every model that participated in one completion.
///
/// Keyed by model name; a BTreeMap keeps report output deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub models: BTreeMap<String, ModelUsage>,
}

impl UsageSummary {
    pub fn record(&mut self, model: impl Into<String>, input_tokens: u64, output_tokens: u64) {
        let entry = self.models.entry(model.into()).or_default();
        entry.total_calls += 1;
        entry.input_tokens += input_tokens;
        entry.output_tokens += output_tokens;
    }

    pub fn total_input_tokens(&self) -> u64 {
        self.models.values().map(|u| u.input_tokens).sum()
    }

    pub fn total_output_tokens(&self) -> u64 {
        self.models.values().map(|u| u.output_tokens).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Successful outcome of one backend completion.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub response: String,
    pub execution_time: Duration,
    pub usage: UsageSummary,
}

/// The completion service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// A human-readable name for this backend.
    fn name(&self) -> &str;

    /// Send one request and wait for the complete response.
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> std::result::Result<CompletionOutcome, BackendError>;
}

/// Builds a fresh backend for every executor attempt, so a retry never
/// reuses possibly-poisoned connection state.
pub trait BackendFactory: Send + Sync {
    fn build(&self) -> Arc<dyn CompletionBackend>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(model: &str) -> ModelConfig {
        ModelConfig::new(model, "https://api.example.com/v1", "sk-test")
    }

    #[test]
    fn secondary_kept_when_distinct() {
        let request = CompletionRequest::new("q", ContextPayload::Text("ctx".into()), cfg("big"))
            .with_secondary(Some(cfg("small")));
        assert_eq!(request.secondary.as_ref().unwrap().model, "small");
    }

    #[test]
    fn secondary_dropped_when_same_as_primary() {
        let request = CompletionRequest::new("q", ContextPayload::Text("ctx".into()), cfg("big"))
            .with_secondary(Some(cfg("big")));
        assert!(request.secondary.is_none());
    }

    #[test]
    fn secondary_dropped_when_none() {
        let request = CompletionRequest::new("q", ContextPayload::Text("ctx".into()), cfg("big"))
            .with_secondary(None);
        assert!(request.secondary.is_none());
    }

    #[test]
    fn max_depth_defaults_to_one_level() {
        let request = CompletionRequest::new("q", ContextPayload::Text("ctx".into()), cfg("m"));
        assert_eq!(request.max_depth, SUB_MODEL_MAX_DEPTH);
        assert_eq!(request.max_depth, 1);
    }

    #[test]
    fn usage_summary_accumulates_per_model() {
        let mut usage = UsageSummary::default();
        usage.record("kimi-k2.5", 1000, 500);
        usage.record("kimi-k2.5", 200, 100);
        usage.record("kimi-k2-turbo-preview", 50, 25);

        let root = &usage.models["kimi-k2.5"];
        assert_eq!(root.total_calls, 2);
        assert_eq!(root.input_tokens, 1200);
        assert_eq!(root.output_tokens, 600);
        assert_eq!(usage.total_input_tokens(), 1250);
        assert_eq!(usage.total_output_tokens(), 625);
    }

    #[test]
    fn model_config_debug_redacts_api_key() {
        let dump = format!("{:?}", cfg("m"));
        assert!(dump.contains("[REDACTED]"));
        assert!(!dump.contains("sk-test"));
    }
}
