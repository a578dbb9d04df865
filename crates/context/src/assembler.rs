//! Char-budgeted context assembly.
//!
//! Concatenates workspace notes and parsed sessions into either one bounded
//! string or an ordered list of bounded chunks. The budget is a hard
//! invariant: the emitted character count never exceeds `max_chars`. When a
//! part does not fit, it is truncated with an explicit marker if a useful
//! tail still fits, otherwise dropped entirely rather than emitted as a
//! near-empty fragment. Assembly is deterministic: identical inputs always
//! produce identical payloads.

use chrono::{DateTime, Utc};
use hindsight_core::context::{ContextBudget, ContextMode, ContextPayload};
use hindsight_core::session::SessionFormat;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Appended to a truncated part. Counted inside the budget.
pub const TRUNCATION_MARKER: &str = "\n[...truncated due to memory limit]";

/// Sessions with less parsed text than this are excluded outright.
pub const MIN_SESSION_CHARS: usize = 50;

/// A truncated tail shorter than this is not worth emitting.
pub const MIN_TAIL_CHARS: usize = 1000;

/// `Auto` resolves to chunks above this unbounded size.
pub const AUTO_CHUNK_THRESHOLD: usize = 600_000;

/// Titles are display-truncated to bound header size.
pub const TITLE_DISPLAY_MAX: usize = 120;

const SECTION_JOINER: &str = "\n\n";
const WORKSPACE_RULE: &str =
    "============================================================";

/// One session's parsed text plus header metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPart {
    pub id: String,
    pub resolved_at: Option<DateTime<Utc>>,
    pub format: SessionFormat,
    pub title: Option<String>,
    pub branch_id: Option<String>,
    pub parent_id: Option<String>,
    pub text: String,
}

impl SessionPart {
    /// The session header: identifier, resolved date, source format, and
    /// whatever index metadata is known. Absent fields are omitted.
    fn header(&self) -> String {
        let mut header = format!("=== SESSION:{}", self.id);
        if let Some(at) = self.resolved_at {
            header.push_str(&format!(" DATE:{}", at.format("%Y-%m-%d %H:%M")));
        }
        header.push_str(&format!(" FMT:{}", self.format));
        if let Some(title) = &self.title {
            header.push_str(&format!(" TITLE:{}", truncate_chars(title, TITLE_DISPLAY_MAX)));
        }
        if let Some(branch) = &self.branch_id {
            header.push_str(&format!(" BRANCH:{branch}"));
        }
        if let Some(parent) = &self.parent_id {
            header.push_str(&format!(" PARENT:{parent}"));
        }
        header.push_str(" ===");
        header
    }

    fn block(&self) -> String {
        format!("{}\n{}", self.header(), self.text)
    }
}

/// What assembly did, for the run report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyStats {
    pub total_chars: usize,
    pub sessions_included: usize,
    pub sessions_skipped_short: usize,
    pub parts_dropped_budget: usize,
    pub truncated: bool,
}

/// The assembled context plus its stats.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub payload: ContextPayload,
    pub stats: AssemblyStats,
}

impl AssembledContext {
    pub fn resolved_mode(&self) -> ContextMode {
        self.payload.resolved_mode()
    }
}

/// The context assembler. Stateless; create one and reuse it.
pub struct ContextAssembler {
    budget: ContextBudget,
}

impl ContextAssembler {
    pub fn new(budget: ContextBudget) -> Self {
        Self { budget }
    }

    /// Assemble workspace notes and session parts under the budget.
    ///
    /// `constrained` reflects the resource profile; it only matters for
    /// `Auto` mode resolution.
    pub fn assemble(
        &self,
        workspace_text: &str,
        sessions: &[SessionPart],
        mode: ContextMode,
        constrained: bool,
    ) -> AssembledContext {
        let workspace = (!workspace_text.trim().is_empty()).then(|| workspace_text.to_string());

        let mut skipped_short = 0usize;
        let mut blocks = Vec::new();
        for part in sessions {
            if part.text.chars().count() < MIN_SESSION_CHARS {
                skipped_short += 1;
            } else {
                blocks.push(part.block());
            }
        }

        let resolved = match mode {
            ContextMode::Text => ContextMode::Text,
            ContextMode::Chunks => ContextMode::Chunks,
            ContextMode::Auto => {
                let unbounded = unbounded_size(workspace.as_deref(), &blocks);
                if constrained || unbounded > AUTO_CHUNK_THRESHOLD {
                    ContextMode::Chunks
                } else {
                    ContextMode::Text
                }
            }
        };

        let assembled = match resolved {
            ContextMode::Chunks => self.assemble_chunks(workspace, blocks, skipped_short),
            _ => self.assemble_text(workspace, blocks, skipped_short),
        };
        debug!(
            mode = %assembled.resolved_mode(),
            chars = assembled.stats.total_chars,
            sessions = assembled.stats.sessions_included,
            "Context assembled"
        );
        assembled
    }

    fn assemble_text(
        &self,
        workspace: Option<String>,
        blocks: Vec<String>,
        skipped_short: usize,
    ) -> AssembledContext {
        let max = self.budget.max_chars;
        let marker_chars = TRUNCATION_MARKER.chars().count();
        let mut stats = AssemblyStats {
            sessions_skipped_short: skipped_short,
            ..Default::default()
        };

        let has_workspace = workspace.is_some();
        let mut parts: Vec<(String, String, bool)> = Vec::new();
        if let Some(ws) = workspace {
            parts.push((String::new(), ws, false));
        }
        for (i, block) in blocks.into_iter().enumerate() {
            let joiner = if i == 0 && has_workspace {
                format!("{SECTION_JOINER}{WORKSPACE_RULE}{SECTION_JOINER}")
            } else if i == 0 {
                String::new()
            } else {
                SECTION_JOINER.to_string()
            };
            parts.push((joiner, block, true));
        }

        let mut out = String::new();
        let mut used = 0usize;
        let mut exhausted = false;
        for (joiner, content, is_session) in parts {
            if exhausted {
                stats.parts_dropped_budget += 1;
                continue;
            }
            let joiner_chars = joiner.chars().count();
            let content_chars = content.chars().count();
            if used + joiner_chars + content_chars <= max {
                out.push_str(&joiner);
                out.push_str(&content);
                used += joiner_chars + content_chars;
                if is_session {
                    stats.sessions_included += 1;
                }
                continue;
            }

            // Out of budget. Keep a truncated tail only when it clears the
            // usefulness threshold; the marker counts against the budget.
            let room = max.saturating_sub(used + joiner_chars);
            if room > MIN_TAIL_CHARS {
                out.push_str(&joiner);
                out.push_str(truncate_chars(&content, room - marker_chars));
                out.push_str(TRUNCATION_MARKER);
                used += joiner_chars + room;
                if is_session {
                    stats.sessions_included += 1;
                }
                stats.truncated = true;
            } else {
                stats.parts_dropped_budget += 1;
            }
            exhausted = true;
        }

        stats.total_chars = used;
        AssembledContext {
            payload: ContextPayload::Text(out),
            stats,
        }
    }

    fn assemble_chunks(
        &self,
        workspace: Option<String>,
        blocks: Vec<String>,
        skipped_short: usize,
    ) -> AssembledContext {
        let max = self.budget.max_chars;
        let marker_chars = TRUNCATION_MARKER.chars().count();
        let mut stats = AssemblyStats {
            sessions_skipped_short: skipped_short,
            ..Default::default()
        };

        let parts = workspace
            .into_iter()
            .map(|ws| (ws, false))
            .chain(blocks.into_iter().map(|b| (b, true)));

        let mut chunks = Vec::new();
        let mut used = 0usize;
        let mut exhausted = false;
        for (content, is_session) in parts {
            if exhausted {
                stats.parts_dropped_budget += 1;
                continue;
            }
            let content_chars = content.chars().count();
            if used + content_chars <= max {
                used += content_chars;
                if is_session {
                    stats.sessions_included += 1;
                }
                chunks.push(content);
                continue;
            }

            let room = max - used;
            if room > MIN_TAIL_CHARS {
                let mut chunk = truncate_chars(&content, room - marker_chars).to_string();
                chunk.push_str(TRUNCATION_MARKER);
                chunks.push(chunk);
                used += room;
                if is_session {
                    stats.sessions_included += 1;
                }
                stats.truncated = true;
            } else {
                stats.parts_dropped_budget += 1;
            }
            exhausted = true;
        }

        stats.total_chars = used;
        AssembledContext {
            payload: ContextPayload::Chunks(chunks),
            stats,
        }
    }
}

fn unbounded_size(workspace: Option<&str>, blocks: &[String]) -> usize {
    let mut total = workspace.map_or(0, |w| w.chars().count());
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 || workspace.is_some() {
            total += SECTION_JOINER.chars().count();
        }
        total += block.chars().count();
    }
    total
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
