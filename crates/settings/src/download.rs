use crate::resolve::MetaSettings;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

const DELETE_WHILE_READING: &str = "deleteChaptersWhileReading";
/// Name the delete-while-reading setting had while it was a boolean.
const LEGACY_DELETE_WHILE_READING: &str = "chapterToDelete";

/// Download and cleanup settings, stored on the global holder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadSettings {
    /// `0` disables deletion; `n` deletes the chapter `n - 1` positions
    /// before the one just finished.
    pub delete_chapters_while_reading: u32,
    pub delete_chapters_manually_marked_read: bool,
    pub delete_chapters_with_bookmark: bool,
    /// Unread chapters to keep downloaded ahead of the reading position.
    pub download_ahead_limit: u32,
}

/// Normalize a stored delete-while-reading value: legacy booleans become
/// `0`/`1`, numbers pass through, anything else is dropped.
pub fn normalize_delete_while_reading(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(enabled) => Some(json!(u32::from(*enabled))),
        Value::Number(_) => Some(value.clone()),
        _ => None,
    }
}

impl MetaSettings for DownloadSettings {
    fn migrate(values: &mut Map<String, Value>) {
        let legacy = values.remove(LEGACY_DELETE_WHILE_READING);
        let current = values.remove(DELETE_WHILE_READING);
        // An unusable current value falls back to the legacy one.
        let normalized = current
            .as_ref()
            .and_then(normalize_delete_while_reading)
            .or_else(|| legacy.as_ref().and_then(normalize_delete_while_reading));
        if let Some(normalized) = normalized {
            values.insert(DELETE_WHILE_READING.to_string(), normalized);
        }
    }
}
