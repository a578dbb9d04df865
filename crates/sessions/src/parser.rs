//! Transcript parsing: raw JSONL to normalized, role-filtered records.
//!
//! The parser is pure. It never touches the filesystem, so the logic is
//! testable on raw strings; reading is the loader's job.
//!
//! Transcript format, one JSON object per line:
//! `{type, timestamp, message: {role, content}}` where `content` is either
//! an inline string or a list of typed blocks; only `"text"` blocks carry
//! readable content. Tool calls and tool results are noise for analysis
//! and are dropped. Compaction and branch summaries are synthetic records
//! that stand in for pruned history; those are kept.

use hindsight_core::session::{RecordKind, RecordRole, TranscriptRecord};
use serde::Deserialize;

#[derive(Deserialize)]
struct RawLine {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    message: Option<RawMessage>,
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<RawContent>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawContent {
    Inline(String),
    Blocks(Vec<RawBlock>),
}

#[derive(Deserialize)]
struct RawBlock {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Parse one raw transcript into ordered records.
///
/// Every line is parsed independently; a line that is not valid JSON is
/// skipped. Only records that yield non-empty text are emitted.
pub fn parse(raw: &str) -> Vec<TranscriptRecord> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<RawLine>(line).ok())
        .filter_map(parse_line)
        .collect()
}

fn parse_line(line: RawLine) -> Option<TranscriptRecord> {
    if let Some(kind) = summary_kind(line.kind.as_deref()) {
        let text = line
            .summary
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| line.message.as_ref().and_then(extract_text))?;
        return Some(TranscriptRecord {
            role: RecordRole::Other,
            kind,
            text,
        });
    }

    let message = line.message?;
    let role = match message.role.as_deref() {
        Some("user") => RecordRole::User,
        Some("assistant") => RecordRole::Assistant,
        // toolResult, toolCall, system notes: dropped.
        _ => return None,
    };
    let text = extract_text(&message)?;
    Some(TranscriptRecord {
        role,
        kind: RecordKind::Message,
        text,
    })
}

fn summary_kind(kind: Option<&str>) -> Option<RecordKind> {
    match kind {
        Some("compaction") => Some(RecordKind::CompactionSummary),
        Some("branch_summary") | Some("branchSummary") => Some(RecordKind::BranchSummary),
        _ => None,
    }
}

fn extract_text(message: &RawMessage) -> Option<String> {
    let text = match message.content.as_ref()? {
        RawContent::Inline(s) => s.trim().to_string(),
        RawContent::Blocks(blocks) => blocks
            .iter()
            .filter(|b| b.kind.as_deref() == Some("text"))
            .filter_map(|b| b.text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    };
    (!text.is_empty()).then_some(text)
}

/// Render parsed records as readable lines, in original order.
///
/// Messages become `[role]: text`; compaction and branch summaries become
/// `[memory-summary]: text`.
pub fn render(records: &[TranscriptRecord]) -> String {
    records
        .iter()
        .map(|r| match r.kind {
            RecordKind::Message => format!("[{}]: {}", r.role, r.text),
            RecordKind::CompactionSummary | RecordKind::BranchSummary => {
                format!("[memory-summary]: {}", r.text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
