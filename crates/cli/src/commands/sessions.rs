//! `hindsight sessions` — list discovered session files.

use hindsight_config::AppConfig;
use hindsight_sessions::{discover, find_sessions_root, load_index};
use std::path::PathBuf;

pub async fn run(
    sessions_dir: Option<PathBuf>,
    limit: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let sessions_dir = sessions_dir
        .or_else(|| config.sessions_dir.clone())
        .unwrap_or_else(|| find_sessions_root(&config.agent_home()));

    let index = load_index(&sessions_dir);
    let files = discover(&sessions_dir, &index, limit);

    if files.is_empty() {
        println!("No sessions found under {}", sessions_dir.display());
        return Ok(());
    }

    println!("Sessions under {}", sessions_dir.display());
    println!("{:<40} {:>6} {:<17} TITLE", "ID", "FMT", "DATE");
    for file in &files {
        let date = file
            .resolved_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".into());
        let title = file
            .index_entry
            .as_ref()
            .and_then(|e| e.title.as_deref())
            .unwrap_or("");
        println!("{:<40} {:>6} {:<17} {}", file.id(), file.format.to_string(), date, title);
    }
    println!();
    println!("  {} sessions", files.len());

    Ok(())
}
