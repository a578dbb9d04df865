//! Candidate discovery across the session store's storage layouts.
//!
//! Three sources, in order of trust:
//! 1. `*.jsonl` transcripts directly under the sessions root (the native
//!    format), minus the sidecar index file.
//! 2. Sanitized `*.md` exports under the sibling `exports/sessions` tree.
//! 3. A legacy `transcript.md` anywhere under the root, consulted only
//!    when the first two found nothing.
//!
//! Discovery never fails: a missing root yields an empty list, and any
//! per-file stat error (races, permissions) skips that file alone.

use chrono::{DateTime, Utc};
use hindsight_core::session::{SessionFile, SessionFormat, SessionIndexEntry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::index::{resolved_timestamp, INDEX_FILE_NAME};

/// Extension of native transcript files.
pub const TRANSCRIPT_EXT: &str = "jsonl";

/// File name of legacy single-transcript exports.
const LEGACY_TRANSCRIPT_NAME: &str = "transcript.md";

/// Discover up to `max_sessions` session files, most recent first.
///
/// Recency is the resolved timestamp: index metadata when usable, else the
/// file's mtime. Unknown timestamps sort last.
pub fn discover(
    root: &Path,
    index: &HashMap<String, SessionIndexEntry>,
    max_sessions: usize,
) -> Vec<SessionFile> {
    if !root.exists() {
        return Vec::new();
    }

    let mut files = Vec::new();

    // 1. Native transcripts directly under the root.
    if let Ok(entries) = std::fs::read_dir(root) {
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || path.file_name().is_some_and(|n| n == INDEX_FILE_NAME) {
                continue;
            }
            if path.extension().is_some_and(|e| e == TRANSCRIPT_EXT) {
                push_candidate(&mut files, path, SessionFormat::Transcript, index);
            }
        }
    }

    // 2. Sanitized exports in the sibling tree, recursive.
    if let Some(parent) = root.parent() {
        let exports = parent.join("exports").join("sessions");
        if exports.is_dir() {
            for entry in WalkDir::new(&exports).into_iter().flatten() {
                let path = entry.path();
                if entry.file_type().is_file() && path.extension().is_some_and(|e| e == "md") {
                    push_candidate(&mut files, path.to_path_buf(), SessionFormat::PlainNote, index);
                }
            }
        }
    }

    // 3. Legacy fallback, only when nothing else turned up.
    if files.is_empty() {
        for entry in WalkDir::new(root).into_iter().flatten() {
            if entry.file_type().is_file() && entry.file_name() == LEGACY_TRANSCRIPT_NAME {
                push_candidate(
                    &mut files,
                    entry.path().to_path_buf(),
                    SessionFormat::PlainNote,
                    index,
                );
            }
        }
    }

    files.sort_by(|a, b| b.resolved_at.cmp(&a.resolved_at));
    files.truncate(max_sessions);
    debug!(root = %root.display(), count = files.len(), "Sessions discovered");
    files
}

fn push_candidate(
    files: &mut Vec<SessionFile>,
    path: PathBuf,
    format: SessionFormat,
    index: &HashMap<String, SessionIndexEntry>,
) {
    // A file that cannot be stat'd (deleted mid-scan, permissions) is
    // skipped; it must not abort the whole scan.
    let Ok(mtime) = std::fs::metadata(&path).and_then(|m| m.modified()) else {
        return;
    };

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let index_entry = index.get(&stem).cloned();
    let resolved_at = index_entry
        .as_ref()
        .and_then(resolved_timestamp)
        .or_else(|| Some(DateTime::<Utc>::from(mtime)));

    files.push(SessionFile {
        path,
        format,
        resolved_at,
        index_entry,
    });
}

/// Auto-detect the sessions root under an agent home directory.
///
/// Layout: `<home>/agents/<agentId>/sessions/*.jsonl`, with two legacy
/// locations from older setups. Agents are scanned in sorted order so the
/// result is deterministic. When nothing matches, the conventional default
/// is returned so downstream discovery can still produce an empty result.
pub fn find_sessions_root(home: &Path) -> PathBuf {
    let agents_dir = home.join("agents");
    if agents_dir.is_dir() {
        let mut agent_dirs: Vec<PathBuf> = std::fs::read_dir(&agents_dir)
            .map(|entries| {
                entries
                    .flatten()
                    .map(|e| e.path())
                    .filter(|p| p.is_dir())
                    .collect()
            })
            .unwrap_or_default();
        agent_dirs.sort();

        for agent_dir in agent_dirs {
            let sessions = agent_dir.join("sessions");
            if has_transcripts(&sessions) {
                return sessions;
            }
        }
    }

    // Legacy fallback: some older setups
    for candidate in [home.join("sessions"), home.join("workspace").join("sessions")] {
        if candidate.is_dir()
            && std::fs::read_dir(&candidate).is_ok_and(|mut entries| entries.next().is_some())
        {
            return candidate;
        }
    }

    home.join("agents").join("main").join("sessions")
}

fn has_transcripts(dir: &Path) -> bool {
    std::fs::read_dir(dir).is_ok_and(|entries| {
        entries
            .flatten()
            .any(|e| e.path().extension().is_some_and(|ext| ext == TRANSCRIPT_EXT))
    })
}
