//! `hindsight ask` — the full pipeline: discover, parse, assemble, execute.

use crate::report::RunReport;
use clap::Args;
use hindsight_config::{AppConfig, Overrides, RunSettings};
use hindsight_context::{load_workspace, ContextAssembler, SessionPart};
use hindsight_core::backend::{CompletionRequest, ModelConfig};
use hindsight_core::classify::SubstringClassifier;
use hindsight_core::context::{ContextBudget, ContextMode};
use hindsight_executor::{
    run_with_fallback, CompletionExecutor, ExecutorConfig, RemoteBackendFactory,
};
use hindsight_sessions::{discover, find_sessions_root, load_all, load_index};
use hindsight_telemetry::{CostEstimator, ModelPricing, PricingTable};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Below this many assembled characters the backend is not worth calling.
const MIN_CONTEXT_CHARS: usize = 100;

#[derive(Args)]
pub struct AskArgs {
    /// The question to ask over your history
    #[arg(short, long)]
    pub query: String,

    /// Sessions directory (auto-detected if not specified)
    #[arg(long)]
    pub sessions_dir: Option<PathBuf>,

    /// Workspace directory holding persistent notes
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Maximum sessions to load
    #[arg(long)]
    pub max_sessions: Option<usize>,

    /// Model profile: quality, speed
    #[arg(long)]
    pub model_profile: Option<String>,

    /// Resource profile: standard, constrained, minimal
    #[arg(long)]
    pub resource_profile: Option<String>,

    /// Root model, overriding the profile
    #[arg(long)]
    pub root_model: Option<String>,

    /// Sub-model for auxiliary tasks, overriding the profile
    #[arg(long)]
    pub sub_model: Option<String>,

    /// Fallback model used when the primary fails, overriding the profile
    #[arg(long)]
    pub fallback_model: Option<String>,

    /// Base URL of the completion proxy
    #[arg(long)]
    pub base_url: Option<String>,

    /// API key for the completion proxy
    #[arg(long, env = "HINDSIGHT_API_KEY")]
    pub api_key: Option<String>,

    /// Context mode: text, chunks, auto
    #[arg(long, value_parser = parse_context_mode)]
    pub context_mode: Option<ContextMode>,

    /// Retries for transient backend failures
    #[arg(long)]
    pub max_retries: Option<u32>,
}

fn parse_context_mode(s: &str) -> Result<ContextMode, String> {
    match s {
        "text" => Ok(ContextMode::Text),
        "chunks" => Ok(ContextMode::Chunks),
        "auto" => Ok(ContextMode::Auto),
        other => Err(format!("unknown context mode '{other}' (text, chunks, auto)")),
    }
}

pub async fn run(args: AskArgs) -> Result<(), Box<dyn std::error::Error>> {
    let started = Instant::now();
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let overrides = Overrides {
        model_profile: args.model_profile,
        resource_profile: args.resource_profile,
        root_model: args.root_model,
        sub_model: args.sub_model,
        fallback_model: args.fallback_model,
        max_sessions: args.max_sessions,
        max_retries: args.max_retries,
        context_mode: args.context_mode,
        base_url: args.base_url,
        api_key: args.api_key,
        sessions_dir: args.sessions_dir,
        workspace_dir: args.workspace,
    };
    let settings = RunSettings::resolve(&config, &overrides)?;

    let Some(api_key) = settings.api_key.clone() else {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    HINDSIGHT_API_KEY   (generic)");
        eprintln!("    MOONSHOT_API_KEY    (Moonshot direct)");
        eprintln!("    OPENAI_API_KEY      (OpenAI-compatible proxies)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    };

    // --- Context loading ---
    let agent_home = config.agent_home();
    let sessions_dir = settings
        .sessions_dir
        .clone()
        .unwrap_or_else(|| find_sessions_root(&agent_home));
    let workspace_dir = settings
        .workspace_dir
        .clone()
        .unwrap_or_else(|| agent_home.join("workspace"));

    let index = load_index(&sessions_dir);
    let files = discover(&sessions_dir, &index, settings.max_sessions);
    info!(
        sessions = files.len(),
        dir = %sessions_dir.display(),
        "Loading sessions"
    );

    let parts: Vec<SessionPart> = load_all(files)
        .await
        .into_iter()
        .flatten()
        .map(|loaded| {
            let file = loaded.file;
            let entry = file.index_entry.as_ref();
            SessionPart {
                id: file.id(),
                resolved_at: file.resolved_at,
                format: file.format,
                title: entry.and_then(|e| e.title.clone()),
                branch_id: entry.and_then(|e| e.branch_id.clone()),
                parent_id: entry.and_then(|e| e.parent_id.clone()),
                text: loaded.text,
            }
        })
        .collect();

    let workspace_text = load_workspace(&workspace_dir);

    let assembler = ContextAssembler::new(ContextBudget {
        max_chars: settings.max_chars,
        max_sessions: settings.max_sessions,
    });
    let assembled = assembler.assemble(
        &workspace_text,
        &parts,
        settings.context_mode,
        settings.constrained,
    );
    let context_mode = assembled.resolved_mode();

    // Verify sufficient context exists before spending a completion call.
    if assembled.stats.total_chars < MIN_CONTEXT_CHARS {
        let report = RunReport::skipped(
            context_mode,
            assembled.stats,
            sessions_dir,
            settings,
            started.elapsed().as_secs_f64(),
        );
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    // --- Execution: primary, then one fallback ---
    let primary_config = ModelConfig::new(&settings.root_model, &settings.base_url, &api_key);
    let sub_config = ModelConfig::new(&settings.sub_model, &settings.base_url, &api_key);
    let fallback_config = ModelConfig::new(&settings.fallback_model, &settings.base_url, &api_key);
    let timeout = Duration::from_secs_f64(settings.request_timeout_secs);

    let primary_request = CompletionRequest::new(&args.query, assembled.payload.clone(), primary_config)
        .with_secondary(Some(sub_config))
        .with_max_iterations(settings.max_iterations)
        .with_compaction(settings.compaction, settings.compaction_threshold)
        .with_timeout(timeout);
    // The fallback runs single-tier: the same model serves both levels.
    let fallback_request = CompletionRequest::new(
        &args.query,
        assembled.payload.clone(),
        fallback_config.clone(),
    )
    .with_secondary(Some(fallback_config))
    .with_max_iterations(settings.max_iterations)
    .with_compaction(settings.compaction, settings.compaction_threshold)
    .with_timeout(timeout);

    let pricing = PricingTable::with_defaults().with_overrides(
        config
            .pricing
            .iter()
            .map(|(model, [input, output])| (model.clone(), ModelPricing::new(*input, *output))),
    );
    let executor = CompletionExecutor::new(
        Arc::new(RemoteBackendFactory),
        Arc::new(SubstringClassifier::default()),
        Arc::new(CostEstimator::new(pricing)),
        ExecutorConfig {
            max_retries: settings.max_retries,
            backoff_base: Duration::from_secs_f64(settings.backoff_secs),
        },
    );

    let outcome = run_with_fallback(&executor, &primary_request, &fallback_request).await;

    let report = RunReport::from_outcome(
        outcome,
        context_mode,
        assembled.stats,
        sessions_dir,
        settings,
        started.elapsed().as_secs_f64(),
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
