//! Persisted / import-export document.
//!
//! The JSON shape is `{ items, history, settings: { wheelSize, spinDuration,
//! soundEnabled, darkMode } }`. Parsing goes field by field: a missing (or null)
//! field takes its named default and is reported in [`ParsedDocument::defaulted`],
//! while a field that is present but malformed fails the whole document.

use crate::config::{WheelSettings, DEFAULT_SPIN_DURATION_MS, DEFAULT_WHEEL_SIZE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use ts_rs::TS;

/// Maximum number of history entries kept
pub const HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct HistoryEntry {
    /// Winning label
    pub item: String,
    /// Wall-clock time of the spin, formatted for display
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct WheelDocument {
    pub items: Vec<String>,
    /// Omitted from exported files
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
    pub settings: WheelSettings,
}

impl WheelDocument {
    pub fn to_json_pretty(&self) -> String {
        // Plain strings, bools and integers cannot fail to serialize
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document root must be an object")]
    NotAnObject,
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: &'static str },
}

impl DocumentError {
    fn field(field: impl Into<String>, reason: &'static str) -> Self {
        DocumentError::InvalidField {
            field: field.into(),
            reason,
        }
    }
}

/// Successfully parsed document plus the fields that fell back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub document: WheelDocument,
    pub defaulted: Vec<&'static str>,
}

impl ParsedDocument {
    pub fn used_default(&self, field: &str) -> bool {
        self.defaulted.iter().any(|f| *f == field)
    }
}

/// Look up `key`, recording `name` as defaulted when absent or null.
fn present<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    name: &'static str,
    defaulted: &mut Vec<&'static str>,
) -> Option<&'a Value> {
    match obj.get(key) {
        None | Some(Value::Null) => {
            defaulted.push(name);
            None
        }
        Some(v) => Some(v),
    }
}

fn parse_items(value: &Value) -> Result<Vec<String>, DocumentError> {
    let arr = value
        .as_array()
        .ok_or_else(|| DocumentError::field("items", "expected an array"))?;
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(arr.len());
    for (i, v) in arr.iter().enumerate() {
        let label = v
            .as_str()
            .ok_or_else(|| DocumentError::field(format!("items[{}]", i), "expected a string"))?
            .trim();
        if label.is_empty() {
            return Err(DocumentError::field(format!("items[{}]", i), "empty label"));
        }
        if !seen.insert(label) {
            return Err(DocumentError::field(format!("items[{}]", i), "duplicate label"));
        }
        items.push(label.to_string());
    }
    Ok(items)
}

fn parse_history(value: &Value) -> Result<Vec<HistoryEntry>, DocumentError> {
    let arr = value
        .as_array()
        .ok_or_else(|| DocumentError::field("history", "expected an array"))?;
    arr.iter()
        .take(HISTORY_CAPACITY)
        .enumerate()
        .map(|(i, v)| {
            serde_json::from_value::<HistoryEntry>(v.clone()).map_err(|_| {
                DocumentError::field(format!("history[{}]", i), "expected {item, time}")
            })
        })
        .collect()
}

fn parse_positive(value: &Value, field: &'static str) -> Result<u32, DocumentError> {
    value
        .as_u64()
        .filter(|n| *n > 0 && *n <= u32::MAX as u64)
        .map(|n| n as u32)
        .ok_or_else(|| DocumentError::field(field, "expected a positive integer"))
}

fn parse_bool(value: &Value, field: &'static str) -> Result<bool, DocumentError> {
    value
        .as_bool()
        .ok_or_else(|| DocumentError::field(field, "expected a boolean"))
}

fn parse_settings(
    value: Option<&Value>,
    defaulted: &mut Vec<&'static str>,
) -> Result<WheelSettings, DocumentError> {
    let Some(value) = value else {
        return Ok(WheelSettings::default());
    };
    let obj = value
        .as_object()
        .ok_or_else(|| DocumentError::field("settings", "expected an object"))?;

    let wheel_size = match present(obj, "wheelSize", "settings.wheelSize", defaulted) {
        Some(v) => parse_positive(v, "settings.wheelSize")?,
        None => DEFAULT_WHEEL_SIZE,
    };
    let spin_duration = match present(obj, "spinDuration", "settings.spinDuration", defaulted) {
        Some(v) => parse_positive(v, "settings.spinDuration")?,
        None => DEFAULT_SPIN_DURATION_MS,
    };
    let sound_enabled = match present(obj, "soundEnabled", "settings.soundEnabled", defaulted) {
        Some(v) => parse_bool(v, "settings.soundEnabled")?,
        None => true,
    };
    let dark_mode = match present(obj, "darkMode", "settings.darkMode", defaulted) {
        Some(v) => parse_bool(v, "settings.darkMode")?,
        None => false,
    };

    Ok(WheelSettings {
        wheel_size,
        spin_duration,
        sound_enabled,
        dark_mode,
    })
}

/// Parse a persisted or imported document.
pub fn parse_document(text: &str) -> Result<ParsedDocument, DocumentError> {
    let root: Value = serde_json::from_str(text)?;
    let obj = root.as_object().ok_or(DocumentError::NotAnObject)?;
    let mut defaulted = Vec::new();

    let items = match present(obj, "items", "items", &mut defaulted) {
        Some(v) => parse_items(v)?,
        None => Vec::new(),
    };
    let history = match present(obj, "history", "history", &mut defaulted) {
        Some(v) => parse_history(v)?,
        None => Vec::new(),
    };
    let settings_value = present(obj, "settings", "settings", &mut defaulted);
    let settings = parse_settings(settings_value, &mut defaulted)?;

    Ok(ParsedDocument {
        document: WheelDocument {
            items,
            history,
            settings,
        },
        defaulted,
    })
}
