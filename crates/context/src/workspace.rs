//! Workspace notes loader.
//!
//! The workspace holds curated persistent context, separate from
//! transcripts: a fixed set of named files plus dated notes under
//! `memory/YYYY-MM-DD.md` (the stem sorts chronologically by name).
//! Each source has its own gate so a single runaway file cannot eat the
//! whole context budget. Unreadable or trivially short files are skipped.

use std::path::Path;
use tracing::warn;

/// The named context files, in inclusion order.
pub const NAMED_FILES: [&str; 6] = [
    "MEMORY.md",
    "SOUL.md",
    "AGENTS.md",
    "USER.md",
    "IDENTITY.md",
    "TOOLS.md",
];

/// A named file larger than this is skipped entirely.
pub const NAMED_FILE_MAX_CHARS: usize = 50_000;

/// Cumulative cap across all dated notes.
pub const DAILY_NOTES_MAX_CHARS: usize = 200_000;

/// At most this many dated notes, most recent first.
pub const DAILY_NOTES_MAX_FILES: usize = 30;

/// Dated notes shorter than this are noise.
pub const DAILY_NOTE_MIN_CHARS: usize = 20;

/// Load the workspace into one headed text block.
pub fn load_workspace(dir: &Path) -> String {
    let mut parts = Vec::new();

    for name in NAMED_FILES {
        let path = dir.join(name);
        if !path.exists() {
            continue;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable workspace file");
                continue;
            }
        };
        if content.trim().is_empty() || content.chars().count() >= NAMED_FILE_MAX_CHARS {
            continue;
        }
        parts.push(format!("=== {name} ===\n{content}"));
    }

    parts.extend(load_daily_notes(&dir.join("memory")));

    parts.join("\n\n")
}

fn load_daily_notes(memory_dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(memory_dir) else {
        return Vec::new();
    };

    let mut notes: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "md"))
        .collect();
    // YYYY-MM-DD stems sort chronologically; reverse for most recent first.
    notes.sort_by_key(|p| std::cmp::Reverse(p.file_stem().map(|s| s.to_os_string())));
    notes.truncate(DAILY_NOTES_MAX_FILES);

    let mut parts = Vec::new();
    let mut used = 0usize;
    for path in notes {
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        let chars = content.chars().count();
        if content.trim().is_empty() || chars < DAILY_NOTE_MIN_CHARS {
            continue;
        }
        if used + chars > DAILY_NOTES_MAX_CHARS {
            break;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        parts.push(format!("=== DAILY:{name} ===\n{content}"));
        used += chars;
    }
    parts
}
