//! Session domain types: discovered files, sidecar index entries, and
//! parsed transcript records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// On-disk format of a discovered session file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionFormat {
    /// Line-oriented structured transcript (`*.jsonl`).
    Transcript,
    /// Sanitized plain-text export or legacy markdown transcript.
    PlainNote,
}

impl std::fmt::Display for SessionFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transcript => write!(f, "jsonl"),
            Self::PlainNote => write!(f, "md"),
        }
    }
}

/// A candidate session file. Immutable once discovered.
#[derive(Debug, Clone)]
pub struct SessionFile {
    pub path: PathBuf,
    pub format: SessionFormat,
    /// Resolved timestamp: index metadata when usable, else file mtime.
    /// `None` means unknown; unknown sorts after every known timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Sidecar index metadata for this session, when present.
    pub index_entry: Option<SessionIndexEntry>,
}

impl SessionFile {
    /// The session identifier: the file name without its extension.
    pub fn id(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One entry of the sessions sidecar index.
///
/// The sidecar is written by another process and has drifted over time, so
/// every field is optional and timestamps are kept as raw JSON values until
/// resolution. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionIndexEntry {
    #[serde(default, alias = "sessionId")]
    pub id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default, alias = "branchId")]
    pub branch_id: Option<String>,

    #[serde(default, alias = "parentId")]
    pub parent_id: Option<String>,

    #[serde(default, alias = "updatedAt")]
    pub updated_at: Option<serde_json::Value>,

    #[serde(default, alias = "lastMessageAt")]
    pub last_message_at: Option<serde_json::Value>,

    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,

    #[serde(default, alias = "createdAt")]
    pub created_at: Option<serde_json::Value>,
}

/// Speaker role of one transcript record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordRole {
    User,
    Assistant,
    /// Anything else (tool results, tool calls, system notes).
    Other,
}

impl std::fmt::Display for RecordRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// What kind of transcript line a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// An ordinary conversational message.
    Message,
    /// A synthetic summary of compacted-away history.
    CompactionSummary,
    /// A synthetic summary of a diverged branch.
    BranchSummary,
}

/// One parsed transcript line with non-empty text.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptRecord {
    pub role: RecordRole,
    pub kind: RecordKind,
    pub text: String,
}
