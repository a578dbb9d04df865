//! Concurrent session loading.
//!
//! Reads and parses the selected files in parallel, bounded by a fixed
//! semaphore rather than by `max_sessions` (which is user-configurable and
//! could be arbitrarily high). No partial results surface mid-flight: the
//! caller gets one slot per input file, in input order, once every task has
//! finished. A failed read yields `None` for that file alone.

use crate::parser;
use hindsight_core::session::{SessionFile, SessionFormat};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::warn;

/// Upper bound on concurrent file reads.
pub const MAX_CONCURRENT_READS: usize = 8;

/// A fully loaded session, ready for assembly.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    pub file: SessionFile,
    /// Rendered transcript text, or the raw content for plain notes.
    pub text: String,
}

/// Load every file concurrently; join before returning.
pub async fn load_all(files: Vec<SessionFile>) -> Vec<Option<LoadedSession>> {
    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_READS));

    let handles: Vec<_> = files
        .into_iter()
        .map(|file| {
            let semaphore = Arc::clone(&semaphore);
            tokio::spawn(async move {
                // The semaphore is never closed, so acquire only fails if
                // the runtime is shutting down; treat that as a failed read.
                let _permit = semaphore.acquire_owned().await.ok()?;
                load_one(file).await
            })
        })
        .collect();

    let mut loaded = Vec::with_capacity(handles.len());
    for handle in handles {
        loaded.push(handle.await.unwrap_or(None));
    }
    loaded
}

async fn load_one(file: SessionFile) -> Option<LoadedSession> {
    let raw = match tokio::fs::read_to_string(&file.path).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %file.path.display(), error = %e, "Skipping unreadable session file");
            return None;
        }
    };

    let text = match file.format {
        SessionFormat::Transcript => parser::render(&parser::parse(&raw)),
        SessionFormat::PlainNote => raw,
    };

    Some(LoadedSession { file, text })
}
