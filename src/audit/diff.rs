//! Structural diff between two record snapshots
//!
//! Compares two mappings key by key, recursing into values that are
//! mappings on both sides. Arrays and every other value are compared as
//! opaque leaves. A [`RedactionPolicy`] removes excluded locations and masks
//! hidden ones.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::redaction::{RedactionPolicy, HIDDEN_MARKER};

/// How one key present on both sides changed
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Both sides were mappings; the nested diff is non-empty
    Nested(Diff),
    /// The value was replaced
    Values { old_value: Value, new_value: Value },
    /// Something changed at a hidden path
    Hidden,
}

/// Result of comparing two mappings
///
/// Serializes with only the non-empty sections present, so an unchanged
/// record diffs to `{}`. Keys within each section are sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    /// Keys present only in the new mapping, with their new values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub added: BTreeMap<String, Value>,

    /// Keys present only in the old mapping, with their old values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub removed: BTreeMap<String, Value>,

    /// Keys present on both sides whose values differ
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub updated: BTreeMap<String, Change>,
}

impl Diff {
    /// True if nothing was added, removed or updated
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }

    /// Human-readable change lines, one per leaf, with dotted paths
    pub fn summary(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.collect_summary("", &mut lines);
        lines
    }

    fn collect_summary(&self, prefix: &str, lines: &mut Vec<String>) {
        let path = |key: &str| {
            if prefix.is_empty() {
                key.to_string()
            } else {
                format!("{}.{}", prefix, key)
            }
        };

        for (key, value) in &self.added {
            lines.push(format!("{}: (added) -> {}", path(key), format_value(value)));
        }
        for (key, value) in &self.removed {
            lines.push(format!("{}: {} -> (removed)", path(key), format_value(value)));
        }
        for (key, change) in &self.updated {
            match change {
                Change::Nested(nested) => nested.collect_summary(&path(key), lines),
                Change::Values {
                    old_value,
                    new_value,
                } => lines.push(format!(
                    "{}: {} -> {}",
                    path(key),
                    format_value(old_value),
                    format_value(new_value)
                )),
                Change::Hidden => lines.push(format!("{}: {}", path(key), HIDDEN_MARKER)),
            }
        }
    }
}

impl Serialize for Change {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Pair<'a> {
            old_value: &'a Value,
            new_value: &'a Value,
        }

        match self {
            Change::Nested(diff) => diff.serialize(serializer),
            Change::Values {
                old_value,
                new_value,
            } => Pair {
                old_value,
                new_value,
            }
            .serialize(serializer),
            Change::Hidden => serializer.serialize_str(HIDDEN_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for Change {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) if s == HIDDEN_MARKER => Ok(Change::Hidden),
            Value::Object(mut obj) if obj.contains_key("old_value") || obj.contains_key("new_value") => {
                Ok(Change::Values {
                    old_value: obj.remove("old_value").unwrap_or(Value::Null),
                    new_value: obj.remove("new_value").unwrap_or(Value::Null),
                })
            }
            value @ Value::Object(_) => serde_json::from_value(value)
                .map(Change::Nested)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!("invalid diff change: {}", other))),
        }
    }
}

/// Compute the structural diff from `old` to `new` under `policy`
pub fn diff(old: &Map<String, Value>, new: &Map<String, Value>, policy: &RedactionPolicy) -> Diff {
    let mut path = Vec::new();
    diff_level(old, new, policy, &mut path)
}

fn diff_level<'a>(
    old: &'a Map<String, Value>,
    new: &'a Map<String, Value>,
    policy: &RedactionPolicy,
    path: &mut Vec<&'a str>,
) -> Diff {
    let mut result = Diff::default();

    for (key, new_value) in new {
        path.push(key);
        if !policy.is_excluded(path.as_slice()) {
            match old.get(key) {
                None => {
                    result
                        .added
                        .insert(key.clone(), policy.reported(path.as_slice(), new_value));
                }
                Some(old_value) => {
                    if let Some(change) = compare(old_value, new_value, policy, path) {
                        result.updated.insert(key.clone(), change);
                    }
                }
            }
        }
        path.pop();
    }

    for (key, old_value) in old {
        if new.contains_key(key) {
            continue;
        }
        path.push(key);
        if !policy.is_excluded(path.as_slice()) {
            result
                .removed
                .insert(key.clone(), policy.reported(path.as_slice(), old_value));
        }
        path.pop();
    }

    result
}

fn compare<'a>(
    old_value: &'a Value,
    new_value: &'a Value,
    policy: &RedactionPolicy,
    path: &mut Vec<&'a str>,
) -> Option<Change> {
    let change = match (old_value, new_value) {
        (Value::Object(old_obj), Value::Object(new_obj)) => {
            let nested = diff_level(old_obj, new_obj, policy, path);
            if nested.is_empty() {
                return None;
            }
            Change::Nested(nested)
        }
        _ if old_value == new_value => return None,
        _ => Change::Values {
            old_value: policy.reported(path.as_slice(), old_value),
            new_value: policy.reported(path.as_slice(), new_value),
        },
    };

    if policy.is_hidden(path.as_slice()) {
        Some(Change::Hidden)
    } else {
        Some(change)
    }
}

/// Format a JSON value for human-readable display
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s == HIDDEN_MARKER => s.clone(),
        Value::String(s) => {
            // Truncate long strings
            if s.chars().count() > 50 {
                let head: String = s.chars().take(47).collect();
                format!("\"{}...\"", head)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
