//! `hindsight doctor` — diagnose configuration and data layout.

use hindsight_config::{profiles, AppConfig};
use hindsight_context::workspace::NAMED_FILES;
use hindsight_sessions::{discover, find_sessions_root, load_index};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("hindsight doctor");
    println!("────────────────────────────────────────");

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file: {}", config_path.display());
    } else {
        println!("  ⚠  No config file (defaults in effect): {}", config_path.display());
    }

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            println!("  ⛔ Config failed to load: {e}");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠  No API key (set HINDSIGHT_API_KEY)");
    }

    match profiles::model_profile(&config.model_profile) {
        Some(p) => println!(
            "  ✅ Model profile '{}': root {} / sub {}",
            p.name, p.root_model, p.sub_model
        ),
        None => println!("  ⛔ Unknown model profile '{}'", config.model_profile),
    }
    match profiles::resource_profile(&config.resource_profile) {
        Some(p) => println!(
            "  ✅ Resource profile '{}': {} sessions, {} chars",
            p.name, p.max_sessions, p.max_chars
        ),
        None => println!("  ⛔ Unknown resource profile '{}'", config.resource_profile),
    }

    let sessions_dir = config
        .sessions_dir
        .clone()
        .unwrap_or_else(|| find_sessions_root(&config.agent_home()));
    if sessions_dir.is_dir() {
        let index = load_index(&sessions_dir);
        let files = discover(&sessions_dir, &index, usize::MAX);
        println!(
            "  ✅ Sessions: {} found under {} ({} indexed)",
            files.len(),
            sessions_dir.display(),
            index.len()
        );
    } else {
        println!("  ⚠  Sessions directory missing: {}", sessions_dir.display());
    }

    let workspace_dir = config.workspace_dir();
    if workspace_dir.is_dir() {
        let present = NAMED_FILES
            .iter()
            .filter(|name| workspace_dir.join(name).exists())
            .count();
        println!(
            "  ✅ Workspace: {} of {} named files under {}",
            present,
            NAMED_FILES.len(),
            workspace_dir.display()
        );
    } else {
        println!("  ⚠  Workspace directory missing: {}", workspace_dir.display());
    }

    println!("  ✅ Completion proxy: {}", config.base_url);

    Ok(())
}
