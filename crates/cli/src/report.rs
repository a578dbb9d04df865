//! The structured result emitted once per invocation.

use hindsight_config::RunSettings;
use hindsight_context::AssemblyStats;
use hindsight_core::backend::UsageSummary;
use hindsight_core::context::ContextMode;
use hindsight_executor::{PipelineOutcome, RunStatus};
use hindsight_telemetry::CostEstimate;
use serde::Serialize;
use std::path::PathBuf;

/// One report per run, printed to stdout as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub id: String,
    pub status: RunStatus,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_model_used: Option<String>,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub usage: UsageSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_estimate: Option<CostEstimate>,
    /// Backend execution time of the winning attempt.
    pub execution_time_secs: f64,
    /// Wall-clock time of the whole invocation.
    pub total_time_secs: f64,
    pub backoff_secs: Vec<f64>,
    pub context_chars: usize,
    pub context_mode: ContextMode,
    pub assembly: AssemblyStats,
    pub sessions_dir: PathBuf,
    pub resolved_config: RunSettings,
}

impl RunReport {
    pub fn from_outcome(
        outcome: PipelineOutcome,
        context_mode: ContextMode,
        assembly: AssemblyStats,
        sessions_dir: PathBuf,
        settings: RunSettings,
        total_time_secs: f64,
    ) -> Self {
        let attempt = outcome.attempt;
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: attempt.status,
            response: attempt.response,
            model_used: Some(attempt.model_used),
            sub_model_used: attempt.sub_model_used,
            attempts: attempt.attempts,
            fallback_reason: outcome.fallback_reason,
            usage: attempt.usage,
            cost_estimate: attempt.cost_estimate,
            execution_time_secs: attempt.execution_time_secs,
            total_time_secs,
            backoff_secs: attempt.backoff_secs,
            context_chars: assembly.total_chars,
            context_mode,
            assembly,
            sessions_dir,
            resolved_config: settings,
        }
    }

    /// The report for a run skipped before reaching the backend: there was
    /// not enough history to analyze.
    pub fn skipped(
        context_mode: ContextMode,
        assembly: AssemblyStats,
        sessions_dir: PathBuf,
        settings: RunSettings,
        total_time_secs: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: RunStatus::Skipped,
            response: "Not enough history to analyze.".into(),
            model_used: None,
            sub_model_used: None,
            attempts: 0,
            fallback_reason: None,
            usage: UsageSummary::default(),
            cost_estimate: None,
            execution_time_secs: 0.0,
            total_time_secs,
            backoff_secs: Vec::new(),
            context_chars: assembly.total_chars,
            context_mode,
            assembly,
            sessions_dir,
            resolved_config: settings,
        }
    }
}
