//! Sidecar index loading.
//!
//! The session store keeps an optional `sessions.json` next to the
//! transcripts, mapping session ids to metadata (title, branch lineage,
//! timestamps). The file is owned by another process and has shipped in
//! three shapes over time; all of them resolve to the same id → entry map.
//! A missing or corrupt sidecar yields an empty map, never an error.

use chrono::{DateTime, Utc};
use hindsight_core::session::SessionIndexEntry;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// File name of the sidecar index inside the sessions root.
pub const INDEX_FILE_NAME: &str = "sessions.json";

/// Epoch values at or above this are treated as milliseconds.
const EPOCH_MILLIS_CUTOFF: i64 = 1_000_000_000_000;

/// Load the sidecar index from the sessions root.
pub fn load(root: &Path) -> HashMap<String, SessionIndexEntry> {
    let path = root.join(INDEX_FILE_NAME);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(_) => return HashMap::new(),
    };

    let value: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring malformed session index");
            return HashMap::new();
        }
    };

    let map = from_value(value);
    debug!(path = %path.display(), entries = map.len(), "Session index loaded");
    map
}

/// Resolve the three supported on-disk shapes into one id → entry map.
///
/// Shapes: a list under the `sessions` key, a map of arbitrary keys whose
/// values carry their own id, or a bare top-level list. On duplicate ids
/// the first occurrence wins.
fn from_value(value: Value) -> HashMap<String, SessionIndexEntry> {
    let mut map = HashMap::new();

    match value {
        Value::Array(items) => {
            for item in items {
                insert_entry(&mut map, None, item);
            }
        }
        Value::Object(mut obj) => {
            if let Some(Value::Array(items)) = obj.remove("sessions") {
                for item in items {
                    insert_entry(&mut map, None, item);
                }
            } else {
                for (key, item) in obj {
                    insert_entry(&mut map, Some(key), item);
                }
            }
        }
        _ => {}
    }

    map
}

fn insert_entry(map: &mut HashMap<String, SessionIndexEntry>, key: Option<String>, item: Value) {
    let entry: SessionIndexEntry = match serde_json::from_value(item) {
        Ok(entry) => entry,
        Err(_) => return,
    };
    // The entry's own id beats the map key it was filed under.
    let Some(id) = entry.id.clone().or(key) else {
        return;
    };
    map.entry(id).or_insert(entry);
}

/// Resolve an index entry's timestamp.
///
/// Fields are consulted in priority order; the first one that parses wins.
/// Values may be JSON numbers, numeric strings (epoch seconds or
/// milliseconds), or ISO-8601 strings. Numeric strings that overflow i64,
/// and epochs outside chrono's range, resolve to the unknown sentinel
/// (`None`) so they can neither crash discovery nor corrupt ordering.
pub fn resolved_timestamp(entry: &SessionIndexEntry) -> Option<DateTime<Utc>> {
    [
        &entry.updated_at,
        &entry.last_message_at,
        &entry.timestamp,
        &entry.created_at,
    ]
    .into_iter()
    .flatten()
    .find_map(parse_timestamp_value)
}

fn parse_timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => epoch_to_datetime(n.as_i64()?),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if looks_numeric(s) {
                // Overflowing parse means the unknown sentinel, not a
                // fall-through to date parsing.
                return s.parse::<i64>().ok().and_then(epoch_to_datetime);
            }
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }
        _ => None,
    }
}

fn looks_numeric(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn epoch_to_datetime(epoch: i64) -> Option<DateTime<Utc>> {
    if epoch.abs() >= EPOCH_MILLIS_CUTOFF {
        DateTime::from_timestamp_millis(epoch)
    } else {
        DateTime::from_timestamp(epoch, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn entry_with_updated_at(value: Value) -> SessionIndexEntry {
        SessionIndexEntry {
            updated_at: Some(value),
            ..Default::default()
        }
    }

    #[test]
    fn missing_sidecar_yields_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(dir.path()).is_empty());
    }

    #[test]
    fn malformed_sidecar_yields_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join(INDEX_FILE_NAME)).unwrap();
        write!(file, "{{not json at all").unwrap();
        assert!(load(dir.path()).is_empty());
    }

    #[test]
    fn all_three_shapes_resolve_to_the_same_map() {
        let list_under_key = json!({
            "sessions": [
                {"id": "a", "title": "First"},
                {"id": "b", "title": "Second"},
            ]
        });
        let keyed_map = json!({
            "a": {"id": "a", "title": "First"},
            "b": {"id": "b", "title": "Second"},
        });
        let bare_list = json!([
            {"id": "a", "title": "First"},
            {"id": "b", "title": "Second"},
        ]);

        let expected = from_value(list_under_key);
        assert_eq!(expected.len(), 2);
        assert_eq!(from_value(keyed_map), expected);
        assert_eq!(from_value(bare_list), expected);
        assert_eq!(expected["a"].title.as_deref(), Some("First"));
    }

    #[test]
    fn map_key_used_when_entry_has_no_id() {
        let map = from_value(json!({"stem-1": {"title": "Untitled"}}));
        assert_eq!(map["stem-1"].title.as_deref(), Some("Untitled"));
    }

    #[test]
    fn entry_id_beats_map_key() {
        let map = from_value(json!({"old-key": {"id": "real-id", "title": "T"}}));
        assert!(map.contains_key("real-id"));
        assert!(!map.contains_key("old-key"));
    }

    #[test]
    fn first_occurrence_wins_on_duplicate_ids() {
        let map = from_value(json!([
            {"id": "dup", "title": "kept"},
            {"id": "dup", "title": "ignored"},
        ]));
        assert_eq!(map.len(), 1);
        assert_eq!(map["dup"].title.as_deref(), Some("kept"));
    }

    #[test]
    fn entries_without_id_are_skipped_in_lists() {
        let map = from_value(json!([{"title": "no id"}, {"id": "ok"}]));
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("ok"));
    }

    #[test]
    fn epoch_seconds_resolve() {
        let entry = entry_with_updated_at(json!(1_700_000_000));
        let ts = resolved_timestamp(&entry).unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
    }

    #[test]
    fn epoch_milliseconds_resolve() {
        let entry = entry_with_updated_at(json!(1_700_000_000_123_i64));
        let ts = resolved_timestamp(&entry).unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
    }

    #[test]
    fn numeric_string_resolves() {
        let entry = entry_with_updated_at(json!("1700000000"));
        assert!(resolved_timestamp(&entry).is_some());
    }

    #[test]
    fn iso_8601_resolves() {
        let entry = entry_with_updated_at(json!("2026-01-15T10:00:00Z"));
        let ts = resolved_timestamp(&entry).unwrap();
        assert_eq!(ts.format("%Y-%m-%d").to_string(), "2026-01-15");
    }

    #[test]
    fn overflowing_numeric_string_is_the_unknown_sentinel() {
        // Far beyond i64: must resolve to None, not panic or mis-sort.
        let entry = entry_with_updated_at(json!("99999999999999999999999999"));
        assert_eq!(resolved_timestamp(&entry), None);
    }

    #[test]
    fn out_of_range_epoch_is_the_unknown_sentinel() {
        // Fits i64 but overflows chrono's representable range (millis path).
        let entry = entry_with_updated_at(json!(i64::MAX));
        assert_eq!(resolved_timestamp(&entry), None);
    }

    #[test]
    fn garbage_string_is_unknown() {
        let entry = entry_with_updated_at(json!("last tuesday"));
        assert_eq!(resolved_timestamp(&entry), None);
    }

    #[test]
    fn field_priority_order() {
        let entry = SessionIndexEntry {
            updated_at: Some(json!("2026-02-01T00:00:00Z")),
            created_at: Some(json!("2026-01-01T00:00:00Z")),
            ..Default::default()
        };
        let ts = resolved_timestamp(&entry).unwrap();
        assert_eq!(ts.format("%Y-%m-%d").to_string(), "2026-02-01");
    }

    #[test]
    fn unparsable_first_field_falls_through_to_next() {
        let entry = SessionIndexEntry {
            updated_at: Some(json!("not a date")),
            created_at: Some(json!("2026-01-01T00:00:00Z")),
            ..Default::default()
        };
        let ts = resolved_timestamp(&entry).unwrap();
        assert_eq!(ts.format("%Y-%m-%d").to_string(), "2026-01-01");
    }
}
